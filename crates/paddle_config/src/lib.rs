// --- File: crates/paddle_config/src/lib.rs ---

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;

pub mod models;
pub use models::*;

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// Guarded by a `OnceCell` so repeated calls (e.g. from tests) are cheap and
/// only the first one touches the filesystem.
pub fn ensure_dotenv_loaded() {
    INIT_DOTENV.get_or_init(|| {
        let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());
        dotenv::from_filename(&dotenv_path).ok();
    });
}

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. `config/default.*` (any format the config crate understands)
/// 2. `config/<RUN_ENV>.*` when `RUN_ENV` is set
/// 3. environment variables prefixed with `APP`, `__`-separated
///    (e.g. `APP_PADDLE__API_KEY` overrides `paddle.api_key`)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "default".to_string());

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::models::*;

    fn paddle_config() -> PaddleConfig {
        PaddleConfig {
            vendor_id: 12345,
            api_key: "key".to_string(),
            api_base_url: None,
            currency: "USD".to_string(),
            product_name: "Store Checkout".to_string(),
            product_icon: "https://example.com/icon.png".to_string(),
            return_url: "https://example.com/thanks".to_string(),
            webhook_url: "https://example.com/api/paddle/webhook".to_string(),
            send_product_names: false,
            vat_included_in_price: true,
        }
    }

    #[test]
    fn endpoint_urls_default_to_production_root() {
        let cfg = paddle_config();
        assert_eq!(
            cfg.pay_link_url(),
            "https://vendors.paddle.com/api/2.0/product/generate_pay_link"
        );
        assert_eq!(
            cfg.public_key_url(),
            "https://vendors.paddle.com/api/2.0/user/get_public_key"
        );
    }

    #[test]
    fn endpoint_urls_honor_base_override() {
        let mut cfg = paddle_config();
        cfg.api_base_url = Some("http://127.0.0.1:9900/".to_string());
        assert_eq!(
            cfg.pay_link_url(),
            "http://127.0.0.1:9900/api/2.0/product/generate_pay_link"
        );
    }

    #[test]
    fn connected_requires_both_credentials() {
        let mut cfg = paddle_config();
        assert!(cfg.is_connected());
        cfg.api_key.clear();
        assert!(!cfg.is_connected());
        cfg.api_key = "key".to_string();
        cfg.vendor_id = 0;
        assert!(!cfg.is_connected());
    }

    #[test]
    fn currency_support_matches_gateway_list() {
        let mut cfg = paddle_config();
        for cur in SUPPORTED_CURRENCIES {
            cfg.currency = cur.to_string();
            assert!(cfg.currency_supported(), "{cur} should be supported");
        }
        cfg.currency = "CHF".to_string();
        assert!(!cfg.currency_supported());
    }
}
