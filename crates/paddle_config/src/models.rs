// --- File: crates/paddle_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Production Paddle vendor API root. Overridable per deployment (and in
/// tests) via `PaddleConfig::api_base_url`.
pub const PADDLE_ROOT_URL: &str = "https://vendors.paddle.com/";
pub const API_GENERATE_PAY_LINK_URL: &str = "api/2.0/product/generate_pay_link";
pub const API_GET_PUBLIC_KEY_URL: &str = "api/2.0/user/get_public_key";

/// Currencies the Paddle checkout accepts.
pub const SUPPORTED_CURRENCIES: [&str; 3] = ["USD", "GBP", "EUR"];

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Paddle Config ---
// Holds vendor credentials and checkout presentation settings. The API key
// can be overridden via env var: APP_PADDLE__API_KEY.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaddleConfig {
    pub vendor_id: u64,
    pub api_key: String,
    /// Vendor API root; defaults to [`PADDLE_ROOT_URL`] when absent.
    pub api_base_url: Option<String>,
    /// ISO-4217 code the store sells in. Must be one of [`SUPPORTED_CURRENCIES`].
    pub currency: String,
    /// Checkout title; the literal `{#order}` is replaced by the order id.
    pub product_name: String,
    /// Icon shown next to the product name on the hosted checkout.
    pub product_icon: String,
    /// Where the hosted checkout sends the shopper when done.
    pub return_url: String,
    /// Endpoint Paddle calls on payment completion; the order id is appended
    /// as a query parameter per request.
    pub webhook_url: String,
    #[serde(default)]
    pub send_product_names: bool,
    #[serde(default = "default_vat_included")]
    pub vat_included_in_price: bool,
}

fn default_vat_included() -> bool {
    true
}

impl PaddleConfig {
    pub fn api_base(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(PADDLE_ROOT_URL)
    }

    pub fn pay_link_url(&self) -> String {
        format!("{}{}", self.api_base(), API_GENERATE_PAY_LINK_URL)
    }

    pub fn public_key_url(&self) -> String {
        format!("{}{}", self.api_base(), API_GET_PUBLIC_KEY_URL)
    }

    /// Both credentials must be present before we can talk to the vendor API.
    pub fn is_connected(&self) -> bool {
        self.vendor_id != 0 && !self.api_key.is_empty()
    }

    pub fn currency_supported(&self) -> bool {
        SUPPORTED_CURRENCIES.contains(&self.currency.as_str())
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_paddle: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub paddle: Option<PaddleConfig>,
}
