//! Serves a free route and a paywalled route on `localhost:8080`.
//!
//! ```text
//! cargo run -p pay402-http --example paywalled-server
//! curl -i http://localhost:8080/premium
//! ```

use axum::Json;
use axum::Router;
use axum::routing::get;
use pay402::PaymentRequirements;
use pay402_http::server::{PaymentMiddleware, VerifiedPayment};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

async fn premium(VerifiedPayment(ctx): VerifiedPayment) -> Json<Value> {
    Json(json!({
        "message": "Premium content!",
        "payment": {
            "txHash": ctx.payment.tx_hash,
            "amount": ctx.payment.amount,
        },
    }))
}

async fn free() -> Json<Value> {
    Json(json!({ "message": "Free content!" }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1 USDC on Base
    let requirements = PaymentRequirements::exact(
        "1000000",
        "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
        "8453",
        "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
    );
    let paywall = PaymentMiddleware::new(requirements).on_payment_verified(|payment, _req| {
        tracing::info!(tx_hash = %payment.tx_hash, sender = %payment.sender, "Payment accepted");
    });

    let app = Router::new()
        .route("/premium", get(premium).layer(paywall))
        .route("/free", get(free));

    let listener = TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
