// --- File: crates/paddle_gateway/src/paylink.rs ---
//! Pay-link creation.
//!
//! Asks the Paddle API to mint a one-time hosted checkout URL for an order
//! and maps the provider response to a normalized [`PayLinkResult`].

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use paddle_common::HTTP_CLIENT;
use paddle_config::{PaddleConfig, SUPPORTED_CURRENCIES};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::PaddleError;
use crate::ledger::Order;

/// The Paddle vendor API answers well within this; treat anything slower as
/// a transport failure.
pub const PAY_LINK_TIMEOUT_SECS: u64 = 45;

/// Everything sent to the pay-link endpoint for one checkout attempt.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PayLinkRequest {
    pub vendor_id: u64,
    pub api_key: String,
    /// Single price entry, `"<CURRENCY>:<amount>"`.
    pub price: String,
    pub return_url: String,
    pub title: String,
    pub image_url: String,
    pub webhook_url: String,
    pub customer_email: String,
    pub customer_country: String,
    pub customer_postcode: String,
    pub custom_message: Option<String>,
    /// base64(JSON) echoed back unmodified on the completion webhook.
    pub passthrough: Option<String>,
}

/// Normalized result of a pay-link request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum PayLinkResult {
    Success {
        order_id: u64,
        checkout_url: String,
        email: String,
        country: String,
        postcode: String,
    },
    Failure {
        errors: Vec<String>,
    },
}

/// One passthrough entry per line item, so a payment can be re-associated to
/// products straight from the Paddle dashboard without a store lookup.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PassthroughEntry {
    pub products: PassthroughProduct,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PassthroughProduct {
    pub id: u64,
    pub name: String,
}

// --- Structures for Paddle API Response ---
#[derive(Deserialize, Debug)]
struct PayLinkApiResponse {
    success: Option<bool>,
    response: Option<PayLinkApiResponseData>,
}

#[derive(Deserialize, Debug)]
struct PayLinkApiResponseData {
    url: String,
}

/// Payable total for the order: tax is stripped unless the Paddle account is
/// configured with VAT included in prices.
pub fn payable_total(order: &Order, vat_included_in_price: bool) -> f64 {
    if vat_included_in_price {
        order.total
    } else {
        order.total - order.tax
    }
}

/// Formats the single price entry as the API expects: decimal string, not
/// integer cents.
pub fn format_price(currency: &str, amount: f64) -> String {
    format!("{}:{:.2}", currency, amount)
}

/// Line-item names joined with `", "`, first occurrence kept, original order.
fn joined_unique_names(order: &Order) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for item in &order.line_items {
        if !seen.contains(&item.name.as_str()) {
            seen.push(&item.name);
        }
    }
    seen.join(", ")
}

/// Builds the immutable request for one checkout attempt. Pure; performs no
/// I/O.
pub fn build_pay_link_request(
    order: &Order,
    config: &PaddleConfig,
) -> Result<PayLinkRequest, PaddleError> {
    if !config.is_connected() {
        return Err(PaddleError::Configuration);
    }
    if !config.currency_supported() {
        return Err(PaddleError::ProviderRejection(format!(
            "currency {} is not supported by Paddle (supported: {})",
            config.currency,
            SUPPORTED_CURRENCIES.join(", ")
        )));
    }

    let total = payable_total(order, config.vat_included_in_price);
    let mut title = config
        .product_name
        .replace("{#order}", &order.id.to_string());
    let mut custom_message = None;
    let mut passthrough = None;

    if config.send_product_names {
        let names = joined_unique_names(order);
        // Duplicates are deduplicated for display but preserved in the
        // passthrough, one entry per line item.
        let entries: Vec<PassthroughEntry> = order
            .line_items
            .iter()
            .map(|item| PassthroughEntry {
                products: PassthroughProduct {
                    id: item.product_id,
                    name: item.name.clone(),
                },
            })
            .collect();
        let json = serde_json::to_vec(&entries)?;
        passthrough = Some(base64_engine.encode(json));
        custom_message = Some(names.clone());
        title = names;
    }

    Ok(PayLinkRequest {
        vendor_id: config.vendor_id,
        api_key: config.api_key.clone(),
        price: format_price(&config.currency, total),
        return_url: config.return_url.clone(),
        title,
        image_url: config.product_icon.clone(),
        webhook_url: format!("{}?order_id={}", config.webhook_url, order.id),
        customer_email: order.billing_email.clone(),
        customer_country: order.billing_country.clone(),
        customer_postcode: order.billing_postcode.clone(),
        custom_message,
        passthrough,
    })
}

/// Form body for the generate_pay_link call, mirroring the field names the
/// vendor API expects.
pub fn to_form(request: &PayLinkRequest) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("vendor_id", request.vendor_id.to_string()),
        ("vendor_auth_code", request.api_key.clone()),
        ("prices[0]", request.price.clone()),
        ("return_url", request.return_url.clone()),
        ("title", request.title.clone()),
        ("image_url", request.image_url.clone()),
        ("webhook_url", request.webhook_url.clone()),
        ("discountable", "0".to_string()),
        ("quantity_variable", "0".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("customer_postcode", request.customer_postcode.clone()),
        ("customer_country", request.customer_country.clone()),
    ];
    if let Some(message) = &request.custom_message {
        form.push(("custom_message", message.clone()));
    }
    if let Some(passthrough) = &request.passthrough {
        form.push(("passthrough", passthrough.clone()));
    }
    form
}

/// Requests a hosted checkout URL for the order.
///
/// Never fails with an error the shopper should not see: every failure mode
/// collapses into `PayLinkResult::Failure` with a generic message, while the
/// operator detail goes to the log.
pub async fn request_pay_link(order: &Order, config: &PaddleConfig) -> PayLinkResult {
    let request = match build_pay_link_request(order, config) {
        Ok(request) => request,
        Err(err) => {
            error!("Paddle error. Unable to build pay-link request: {err}");
            return PayLinkResult::Failure {
                errors: vec![err.shopper_message().to_string()],
            };
        }
    };

    let response = HTTP_CLIENT
        .post(config.pay_link_url())
        .timeout(Duration::from_secs(PAY_LINK_TIMEOUT_SECS))
        .form(&to_form(&request))
        .send()
        .await;

    let body_text = match response {
        Ok(response) => match response.text().await {
            Ok(text) => text,
            Err(err) => return transport_failure(err),
        },
        Err(err) => return transport_failure(err),
    };

    match serde_json::from_str::<PayLinkApiResponse>(&body_text) {
        Ok(PayLinkApiResponse {
            success: Some(true),
            response: Some(data),
        }) => {
            info!("Paddle pay link created for order {}", order.id);
            PayLinkResult::Success {
                order_id: order.id,
                checkout_url: data.url,
                email: order.billing_email.clone(),
                country: order.billing_country.clone(),
                postcode: order.billing_postcode.clone(),
            }
        }
        // success false/absent, or missing url: log the raw body for diagnosis
        Ok(_) | Err(_) => {
            error!("Paddle error. Error response from API. Response: {body_text}");
            PayLinkResult::Failure {
                errors: vec![
                    "Something went wrong. Check if Paddle account is properly integrated."
                        .to_string(),
                ],
            }
        }
    }
}

fn transport_failure(err: reqwest::Error) -> PayLinkResult {
    let err = PaddleError::Transport(err);
    error!("Paddle error. Unable to get API response: {err}");
    PayLinkResult::Failure {
        errors: vec![err.shopper_message().to_string()],
    }
}
