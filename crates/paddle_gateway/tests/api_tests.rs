//! End-to-end tests driving the Paddle router over HTTP, with the vendor API
//! stubbed by wiremock.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use once_cell::sync::Lazy;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paddle_config::{AppConfig, PaddleConfig, ServerConfig};
use paddle_gateway::handlers::PaddleState;
use paddle_gateway::keystore::VendorKeyCache;
use paddle_gateway::ledger::{InMemoryOrderLedger, LineItem, Order};
use paddle_gateway::routes::routes_with_state;
use paddle_gateway::signature::WebhookNotification;

static TEST_KEY: Lazy<RsaPrivateKey> = Lazy::new(|| {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate RSA key")
});

fn public_key_pem() -> String {
    RsaPublicKey::from(&*TEST_KEY)
        .to_public_key_pem(LineEnding::LF)
        .expect("failed to encode public key")
}

fn sign_fields(pairs: &[(String, String)]) -> String {
    let canonical = WebhookNotification::from_pairs(pairs.to_vec()).canonical_bytes();
    let digest = Sha1::digest(canonical);
    let signature = TEST_KEY
        .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
        .expect("failed to sign");
    base64_engine.encode(signature)
}

fn app_config(api_base_url: Option<String>) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        use_paddle: true,
        paddle: Some(PaddleConfig {
            vendor_id: 12345,
            api_key: "secret-key".to_string(),
            api_base_url,
            currency: "USD".to_string(),
            product_name: "Store Checkout".to_string(),
            product_icon: "https://example.com/icon.png".to_string(),
            return_url: "https://example.com/thanks".to_string(),
            webhook_url: "https://example.com/api/paddle/webhook".to_string(),
            send_product_names: false,
            vat_included_in_price: false,
        }),
    })
}

fn sample_order(id: u64) -> Order {
    Order {
        id,
        total: 100.0,
        tax: 20.0,
        billing_email: "shopper@example.com".to_string(),
        billing_country: "US".to_string(),
        billing_postcode: "90210".to_string(),
        line_items: vec![LineItem {
            product_id: 1,
            name: "Widget".to_string(),
        }],
    }
}

struct TestApp {
    router: Router,
    ledger: Arc<InMemoryOrderLedger>,
    key_cache: Arc<VendorKeyCache>,
}

fn test_app(api_base_url: Option<String>) -> TestApp {
    let ledger = Arc::new(InMemoryOrderLedger::new());
    let key_cache = Arc::new(VendorKeyCache::new());
    let state = Arc::new(PaddleState {
        config: app_config(api_base_url),
        ledger: ledger.clone(),
        key_cache: key_cache.clone(),
    });
    TestApp {
        router: routes_with_state(state),
        ledger,
        key_cache,
    }
}

async fn post_form(router: &Router, uri: &str, body: String) -> StatusCode {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

fn signed_webhook_body() -> String {
    let fields = vec![
        ("alert_name".to_string(), "payment_succeeded".to_string()),
        ("currency".to_string(), "USD".to_string()),
    ];
    let signature = sign_fields(&fields);
    let mut pairs = fields;
    pairs.push(("p_signature".to_string(), signature));
    serde_urlencoded::to_string(&pairs).unwrap()
}

#[tokio::test]
async fn create_pay_link_returns_checkout_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/product/generate_pay_link"))
        .and(body_string_contains("vendor_id=12345"))
        .and(body_string_contains("USD%3A80.00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "response": { "url": "https://checkout.paddle.com/checkout/abc123" }
        })))
        .mount(&server)
        .await;

    let app = test_app(Some(format!("{}/", server.uri())));
    app.ledger.insert(sample_order(7));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/paddle/create-pay-link")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"order_id":7}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["result"], "success");
    assert_eq!(
        json["checkout_url"],
        "https://checkout.paddle.com/checkout/abc123"
    );
    assert_eq!(json["email"], "shopper@example.com");
    assert_eq!(json["country"], "US");
    assert_eq!(json["postcode"], "90210");
}

#[tokio::test]
async fn provider_error_response_is_reported_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/product/generate_pay_link"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": { "code": 108, "message": "Unable to find requested product" }
        })))
        .mount(&server)
        .await;

    let app = test_app(Some(format!("{}/", server.uri())));
    app.ledger.insert(sample_order(7));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/paddle/create-pay-link")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"order_id":7}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["result"], "failure");
    assert!(json["errors"][0].as_str().unwrap().contains("integrated"));
}

#[tokio::test]
async fn unknown_order_is_a_404() {
    let app = test_app(None);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/paddle/create-pay-link")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"order_id":99}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verified_webhook_confirms_payment_and_is_idempotent() {
    let app = test_app(None);
    app.ledger.insert(sample_order(5));
    app.key_cache.prime(public_key_pem()).await;

    let body = signed_webhook_body();
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body.clone()).await,
        StatusCode::OK
    );
    assert!(app.ledger.is_paid(5));

    // Providers retry delivery; a second identical call must also succeed
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn tampered_webhook_is_rejected() {
    let app = test_app(None);
    app.ledger.insert(sample_order(5));
    app.key_cache.prime(public_key_pem()).await;

    let fields = vec![
        ("alert_name".to_string(), "payment_succeeded".to_string()),
        ("currency".to_string(), "USD".to_string()),
    ];
    let signature = sign_fields(&fields);
    let tampered = vec![
        ("alert_name".to_string(), "payment_succeeded".to_string()),
        ("currency".to_string(), "GBP".to_string()),
        ("p_signature".to_string(), signature),
    ];
    let body = serde_urlencoded::to_string(&tampered).unwrap();

    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert!(!app.ledger.is_paid(5));
}

#[tokio::test]
async fn non_integer_order_id_is_rejected() {
    let app = test_app(None);
    app.ledger.insert(sample_order(5));
    app.key_cache.prime(public_key_pem()).await;

    let body = signed_webhook_body();
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5abc", body.clone()).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        post_form(&app.router, "/paddle/webhook", body).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert!(!app.ledger.is_paid(5));
}

#[tokio::test]
async fn public_key_is_fetched_lazily_from_the_vendor_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/user/get_public_key"))
        .and(body_string_contains("vendor_id=12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "response": { "public_key": public_key_pem() }
        })))
        .expect(1) // second webhook must hit the cache
        .mount(&server)
        .await;

    let app = test_app(Some(format!("{}/", server.uri())));
    app.ledger.insert(sample_order(5));

    let body = signed_webhook_body();
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body.clone()).await,
        StatusCode::OK
    );
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body).await,
        StatusCode::OK
    );
    assert!(app.ledger.is_paid(5));
}

#[tokio::test]
async fn invalidated_key_cache_refetches_from_the_vendor_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/user/get_public_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "response": { "public_key": public_key_pem() }
        })))
        .expect(2) // invalidation drops the cached key
        .mount(&server)
        .await;

    let app = test_app(Some(format!("{}/", server.uri())));
    app.ledger.insert(sample_order(5));

    let body = signed_webhook_body();
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body.clone()).await,
        StatusCode::OK
    );

    // Credentials changed: the cached key must not be reused
    app.key_cache.invalidate().await;
    assert_eq!(
        post_form(&app.router, "/paddle/webhook?order_id=5", body).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn missing_public_key_rejects_without_panicking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/2.0/user/get_public_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": { "code": 107, "message": "bad credentials" }
        })))
        .mount(&server)
        .await;

    let app = test_app(Some(format!("{}/", server.uri())));
    app.ledger.insert(sample_order(5));

    assert_eq!(
        post_form(
            &app.router,
            "/paddle/webhook?order_id=5",
            signed_webhook_body()
        )
        .await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert!(!app.ledger.is_paid(5));
}
