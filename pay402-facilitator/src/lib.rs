//! Facilitator service for the 402 payment handshake.
//!
//! Exposes any [`pay402::Facilitator`] over HTTP and ships a structural
//! [`LocalFacilitator`] for the bundled binary.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`local`] - In-process facilitator checking payment structure
//! - [`error`] - Facilitator service error types
//! - [`config`] - Server configuration with environment variable expansion
//! - [`util`] - Graceful shutdown signal handling

pub mod config;
pub mod error;
pub mod handlers;
pub mod local;
pub mod util;

pub use handlers::facilitator_router;
pub use local::{LocalFacilitator, LocalFacilitatorError};
