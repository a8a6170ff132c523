// --- File: crates/paddle_gateway/src/lib.rs ---
// Declare modules within this crate
pub mod error;
pub mod handlers;
pub mod keystore;
pub mod ledger;
pub mod paylink;
pub mod routes;
pub mod signature;
pub mod webhook;

pub use error::PaddleError;
pub use ledger::{InMemoryOrderLedger, LineItem, Order, OrderLedger};
pub use paylink::{request_pay_link, PayLinkRequest, PayLinkResult};
pub use routes::routes;
pub use signature::{verify, VerificationOutcome, WebhookNotification};
