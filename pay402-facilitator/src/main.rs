//! Facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p pay402-facilitator --release
//!
//! # Run with custom config path
//! cargo run -p pay402-facilitator -- --config /path/to/config.toml
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p pay402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! Read from the process environment and from a `.env` file if present.
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `8081`)
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use clap::Parser;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pay402_facilitator::config::FacilitatorConfig;
use pay402_facilitator::facilitator_router;
use pay402_facilitator::local::LocalFacilitator;
use pay402_facilitator::util::SigDown;

/// Serves the verify, settle and health endpoints.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = FacilitatorConfig::load_from(&args.config)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        chains = ?config.accepted_chains,
        "Loaded configuration"
    );
    if config.accepted_chains.is_empty() {
        tracing::warn!("No accepted_chains configured, payments on every chain are accepted");
    }

    let facilitator = Arc::new(LocalFacilitator::new(config.accepted_chains));
    let app = facilitator_router(facilitator)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let sig_down = SigDown::try_new()?;
    let token = sig_down.cancellation_token();

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;
    sig_down.recv().await;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}
