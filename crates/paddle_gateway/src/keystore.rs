// --- File: crates/paddle_gateway/src/keystore.rs ---
//! Vendor public key retrieval and caching.
//!
//! The key used to verify webhook signatures is fetched from the vendor API
//! the first time it is needed and kept in memory. Invalidate the cache
//! whenever the vendor id or API key changes; a verification racing a
//! refresh may spuriously fail once and is covered by the provider's own
//! webhook retries.

use paddle_common::HTTP_CLIENT;
use paddle_config::PaddleConfig;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::PaddleError;
use crate::paylink::PAY_LINK_TIMEOUT_SECS;

#[derive(Deserialize, Debug)]
struct PublicKeyApiResponse {
    success: Option<bool>,
    response: Option<PublicKeyApiResponseData>,
}

#[derive(Deserialize, Debug)]
struct PublicKeyApiResponseData {
    public_key: String,
}

/// Cached vendor public key with lazy fetch-and-cache semantics.
#[derive(Default)]
pub struct VendorKeyCache {
    key: RwLock<Option<String>>,
}

impl VendorKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with a known key, skipping the remote fetch.
    pub async fn prime(&self, pem: String) {
        *self.key.write().await = Some(pem);
    }

    /// Drop the cached key. Must be called when credentials change so the
    /// next verification refetches against the new vendor.
    pub async fn invalidate(&self) {
        *self.key.write().await = None;
    }

    /// Returns the cached key, fetching it from the vendor API on first use.
    pub async fn get_or_fetch(&self, config: &PaddleConfig) -> Result<String, PaddleError> {
        if let Some(key) = self.key.read().await.clone() {
            return Ok(key);
        }
        if !config.is_connected() {
            return Err(PaddleError::Configuration);
        }

        let pem = fetch_vendor_public_key(config).await?;
        // Last writer wins if two fetches race; both hold the same key.
        *self.key.write().await = Some(pem.clone());
        info!("cached vendor public key for vendor {}", config.vendor_id);
        Ok(pem)
    }
}

/// Retrieves the vendor public key from the Paddle API.
async fn fetch_vendor_public_key(config: &PaddleConfig) -> Result<String, PaddleError> {
    let form = [
        ("vendor_id", config.vendor_id.to_string()),
        ("vendor_auth_code", config.api_key.clone()),
    ];

    let body_text = HTTP_CLIENT
        .post(config.public_key_url())
        .timeout(Duration::from_secs(PAY_LINK_TIMEOUT_SECS))
        .form(&form)
        .send()
        .await?
        .text()
        .await?;

    match serde_json::from_str::<PublicKeyApiResponse>(&body_text) {
        Ok(PublicKeyApiResponse {
            success: Some(true),
            response: Some(data),
        }) => Ok(data.public_key),
        Ok(_) => {
            error!("Paddle error. Error response fetching public key. Response: {body_text}");
            Err(PaddleError::ProviderRejection(
                "vendor API refused the public key request; check vendor id and API key"
                    .to_string(),
            ))
        }
        Err(err) => {
            error!("Paddle error. Unparseable public key response: {body_text}");
            Err(PaddleError::MalformedResponse(err))
        }
    }
}
