// --- File: crates/paddle_gateway/src/routes.rs ---

use axum::{routing::post, Router};
use paddle_config::AppConfig;
use std::sync::Arc;

use crate::handlers::{create_pay_link_handler, paddle_webhook_handler, PaddleState};
use crate::keystore::VendorKeyCache;
use crate::ledger::OrderLedger;

/// Creates a router containing all routes for the Paddle feature, with a
/// fresh key cache.
///
/// # Arguments
/// * `config` - Shared application configuration (`Arc<AppConfig>`).
/// * `ledger` - The order store the gateway reads from and marks paid.
pub fn routes(config: Arc<AppConfig>, ledger: Arc<dyn OrderLedger>) -> Router {
    routes_with_state(Arc::new(PaddleState {
        config,
        ledger,
        key_cache: Arc::new(VendorKeyCache::new()),
    }))
}

/// Same as [`routes`], but over a caller-built state (used by tests to prime
/// the key cache).
pub fn routes_with_state(state: Arc<PaddleState>) -> Router {
    Router::new()
        // API endpoint called by our checkout frontend to mint the pay link
        .route("/paddle/create-pay-link", post(create_pay_link_handler))
        // API endpoint called by the Paddle SERVER on payment completion
        .route("/paddle/webhook", post(paddle_webhook_handler))
        .with_state(state)
}
