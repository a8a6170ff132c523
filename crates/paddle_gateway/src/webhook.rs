// --- File: crates/paddle_gateway/src/webhook.rs ---
//! Payment confirmation.
//!
//! Sits between the signature check and the order ledger: only a verified
//! notification with a clean order id reference may mark an order paid.
//! Handling is per-request and final; a rejected webhook is answered with a
//! non-200 and the provider retries delivery on its own schedule.

use tracing::info;

use crate::error::PaddleError;
use crate::ledger::OrderLedger;
use crate::signature::VerificationOutcome;

/// Strict positive-integer parse: the canonical rendering of the parsed
/// value must match the raw string exactly, so `"5abc"`, `"007"`, `"-3"` and
/// `""` are all rejected rather than loosely coerced.
pub fn parse_order_id(raw: &str) -> Option<u64> {
    let id = raw.parse::<u64>().ok()?;
    if id > 0 && id.to_string() == raw {
        Some(id)
    } else {
        None
    }
}

/// Marks the order paid iff the notification verified and the order id is a
/// clean reference to an existing order. Returns the confirmed order id, or
/// the rejection cause.
///
/// Safe to call repeatedly for the same order: providers retry webhook
/// delivery, and `OrderLedger::mark_paid` is idempotent.
pub fn confirm_payment(
    raw_order_id: &str,
    outcome: VerificationOutcome,
    ledger: &dyn OrderLedger,
) -> Result<u64, PaddleError> {
    match outcome {
        VerificationOutcome::Verified => {}
        VerificationOutcome::ConfigurationError => return Err(PaddleError::Configuration),
        VerificationOutcome::Unverified => return Err(PaddleError::SignatureInvalid),
    }

    let order_id = parse_order_id(raw_order_id).ok_or_else(|| {
        PaddleError::InputMalformed(format!(
            "order_id is not a positive integer. Got '{raw_order_id}'."
        ))
    })?;

    if ledger.mark_paid(order_id) {
        info!("payment confirmed for order {order_id}");
        Ok(order_id)
    } else {
        Err(PaddleError::InputMalformed(format!(
            "order {order_id} does not exist"
        )))
    }
}
