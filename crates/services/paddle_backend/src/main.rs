// File: services/paddle_backend/src/main.rs
use axum::{routing::get, Router};
use paddle_config::load_config;
use paddle_gateway::routes as paddle_routes;
use paddle_gateway::{InMemoryOrderLedger, OrderLedger};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() {
    paddle_common::logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));

    // The gateway reads orders through this seam; a real deployment plugs in
    // the store's own ledger here.
    let ledger: Arc<dyn OrderLedger> = Arc::new(InMemoryOrderLedger::new());

    let api_router = Router::new()
        .route("/", get(|| async { "Paddle gateway API" }))
        .merge(paddle_routes(config.clone(), ledger));

    let app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
