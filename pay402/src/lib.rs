#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the HTTP 402 payment handshake.
//!
//! A resource server answers an unpaid request with `402 Payment Required`
//! and a set of [`PaymentRequirements`]. The client produces a [`Payment`]
//! (typically by submitting a transaction through its wallet), attaches it to
//! a retried request, and the server checks it with a [`PaymentVerifier`]
//! before serving the resource. An optional facilitator verifies and settles
//! payments out of band through the [`Facilitator`] trait.
//!
//! This crate is transport-agnostic. HTTP client and server plumbing lives in
//! `pay402-http`; the facilitator service lives in `pay402-facilitator`.
//!
//! # Modules
//!
//! - [`proto`] - Wire types exchanged in headers and facilitator bodies
//! - [`timestamp`] - Unix timestamps used for expiry and payment times
//! - [`nonce`] - Random nonce generation for payment requirements
//! - [`verifier`] - Payment verification trait and default policies
//! - [`facilitator`] - Verify/settle trait for facilitator services
//! - [`error`] - Error types shared by verifiers
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod error;
pub mod facilitator;
pub mod nonce;
pub mod proto;
pub mod timestamp;
pub mod verifier;

pub use error::VerifierError;
pub use facilitator::Facilitator;
pub use proto::{
    HealthResponse, Payment, PaymentContext, PaymentRequirements, SCHEME_EXACT, SettleRequest,
    SettleResponse, VerifyRequest, VerifyResponse,
};
pub use timestamp::UnixTimestamp;
pub use verifier::{FacilitatorVerifier, FieldMatchVerifier, PaymentVerifier};
