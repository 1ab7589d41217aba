//! Requests the paywalled route of the `paywalled-server` example, paying
//! with a simulated transaction.
//!
//! ```text
//! cargo run -p pay402-http --example paying-client
//! ```

use pay402::{Payment, PaymentRequirements};
use pay402_http::client::PaymentClient;
use tracing_subscriber::EnvFilter;

const SENDER: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb";

/// Stands in for a wallet: a real handler would sign and submit a
/// transaction, then wait for confirmation.
fn simulate_payment(requirements: &PaymentRequirements) -> Result<Payment, String> {
    tracing::info!(
        amount = %requirements.amount,
        token = %requirements.token,
        chain = %requirements.chain,
        recipient = %requirements.recipient,
        "Payment required"
    );
    let tx_hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
    tracing::info!(tx_hash, "Payment sent");
    Ok(Payment::for_requirements(requirements, tx_hash, SENDER))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let client = PaymentClient::with_handler(simulate_payment);

    tracing::info!("Requesting protected resource");
    let response = client.get("http://localhost:8080/premium").await?;
    let status = response.status();
    let body = response.text().await?;

    tracing::info!(%status, %body, "Response received");
    Ok(())
}
