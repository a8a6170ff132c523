// --- File: crates/paddle_gateway/src/handlers.rs ---
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use paddle_common::HttpStatusCode;
use paddle_config::AppConfig;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::PaddleError;
use crate::keystore::VendorKeyCache;
use crate::ledger::OrderLedger;
use crate::paylink::{request_pay_link, PayLinkResult};
use crate::signature::{verify, VerificationOutcome, WebhookNotification};
use crate::webhook::confirm_payment;

// --- State for Paddle Handlers ---
#[derive(Clone)]
pub struct PaddleState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<dyn OrderLedger>,
    pub key_cache: Arc<VendorKeyCache>,
}

/// Request from our checkout frontend to create a pay link for an existing
/// order.
#[derive(Deserialize, Debug)]
pub struct CreatePayLinkRequest {
    pub order_id: u64,
}

fn status_of(err: &PaddleError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Axum handler to create a Paddle pay link.
///
/// Once the order is found this always answers 200 with the AJAX-style
/// `{result: success|failure}` body; the checkout frontend branches on
/// `result`, not on the HTTP status.
#[axum::debug_handler]
pub async fn create_pay_link_handler(
    State(state): State<Arc<PaddleState>>,
    Json(payload): Json<CreatePayLinkRequest>,
) -> Result<Json<PayLinkResult>, (StatusCode, String)> {
    if !state.config.use_paddle {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Paddle gateway is disabled.".to_string(),
        ));
    }
    let paddle_config = state.config.paddle.as_ref().ok_or_else(|| {
        let err = PaddleError::Configuration;
        (status_of(&err), err.shopper_message().to_string())
    })?;

    let order = state.ledger.order(payload.order_id).ok_or((
        StatusCode::NOT_FOUND,
        format!("Order {} does not exist.", payload.order_id),
    ))?;

    Ok(Json(request_pay_link(&order, paddle_config).await))
}

#[derive(Deserialize, Debug)]
pub struct WebhookQuery {
    /// Kept as the raw string; confirmation applies a strict integer parse.
    pub order_id: Option<String>,
}

/// Axum handler for the payment-completion webhook Paddle calls.
///
/// Replies 200 only for an authenticated notification that marked an
/// existing order paid; everything else is a 500 so the provider retries.
#[axum::debug_handler]
pub async fn paddle_webhook_handler(
    State(state): State<Arc<PaddleState>>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> Response {
    if !state.config.use_paddle {
        return (StatusCode::SERVICE_UNAVAILABLE, "Paddle gateway is disabled.").into_response();
    }
    let paddle_config = match state.config.paddle.as_ref() {
        Some(config) => config,
        None => {
            error!("Paddle error. Webhook received but Paddle configuration not loaded.");
            return status_of(&PaddleError::Configuration).into_response();
        }
    };

    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(&body) {
        Ok(pairs) => pairs,
        Err(err) => {
            let err = PaddleError::InputMalformed(format!("webhook body not form-encoded: {err}"));
            error!("Paddle error. {err}");
            return status_of(&err).into_response();
        }
    };
    let notification = WebhookNotification::from_pairs(pairs);

    // A fetch failure here is a configuration problem, not a forgery: keep
    // the two outcomes distinct for operator alerting.
    let outcome = match state.key_cache.get_or_fetch(paddle_config).await {
        Ok(key) => verify(&notification, &key),
        Err(err) => {
            error!("Paddle error. Unable to obtain vendor public key: {err}");
            VerificationOutcome::ConfigurationError
        }
    };

    match confirm_payment(
        query.order_id.as_deref().unwrap_or(""),
        outcome,
        state.ledger.as_ref(),
    ) {
        Ok(order_id) => {
            info!(
                "webhook '{}' confirmed payment for order {order_id}",
                notification.field("alert_name").unwrap_or("<unnamed>")
            );
            StatusCode::OK.into_response()
        }
        Err(err) => {
            error!("Paddle error. Unable to complete payment: {err}");
            status_of(&err).into_response()
        }
    }
}
