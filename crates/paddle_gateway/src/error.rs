// --- File: crates/paddle_gateway/src/error.rs ---
use paddle_common::HttpStatusCode;
use thiserror::Error;

/// Paddle-specific error types.
///
/// Display text is operator-facing; the string shown to a shopper comes from
/// [`PaddleError::shopper_message`] and never carries transport detail or
/// credentials.
#[derive(Error, Debug)]
pub enum PaddleError {
    /// Network-level failure talking to the Paddle API (timeout, DNS, reset)
    #[error("Paddle API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Well-formed error response from the Paddle API
    #[error("Paddle API rejected the request: {0}")]
    ProviderRejection(String),

    /// Response from the Paddle API had an unexpected shape
    #[error("Failed to parse Paddle API response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Missing or incomplete Paddle configuration (credentials, public key)
    #[error("Paddle configuration missing or incomplete")]
    Configuration,

    /// Webhook signature did not verify; possible forgery attempt
    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    /// Webhook input could not be interpreted (bad base64, non-integer order id, ...)
    #[error("Malformed webhook input: {0}")]
    InputMalformed(String),
}

impl PaddleError {
    /// Generic retry message safe to surface to the shopper. Operator detail
    /// stays in the logs.
    pub fn shopper_message(&self) -> &'static str {
        match self {
            PaddleError::Transport(_) => "Something went wrong. Unable to get API response.",
            PaddleError::ProviderRejection(_) | PaddleError::MalformedResponse(_) => {
                "Something went wrong. Check if Paddle account is properly integrated."
            }
            PaddleError::Configuration => "Payment method is not available right now.",
            // Webhook-path errors have no shopper-facing surface
            PaddleError::SignatureInvalid | PaddleError::InputMalformed(_) => {
                "Something went wrong."
            }
        }
    }
}

impl HttpStatusCode for PaddleError {
    fn status_code(&self) -> u16 {
        match self {
            PaddleError::Transport(_) => 502,
            PaddleError::ProviderRejection(_) => 502,
            PaddleError::MalformedResponse(_) => 502,
            PaddleError::Configuration => 500,
            PaddleError::SignatureInvalid => 500,
            PaddleError::InputMalformed(_) => 500,
        }
    }
}
