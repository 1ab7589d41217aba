//! Tower/axum payment gate for protected routes.
//!
//! [`PaymentMiddleware`] is a tower [`Layer`](tower::Layer). Each request
//! through the layered service goes through the [`Paygate`]:
//!
//! - no `X-Payment-Response` header: `402 Payment Required` with the
//!   requirements in `X-Payment` and in the JSON body
//! - malformed header: `400 Invalid payment format`
//! - payment rejected by the verifier: `402 Payment verification failed`
//! - verifier error: `400 Payment verification failed: <error>`
//! - payment accepted: the wrapped service runs with a
//!   [`PaymentContext`](pay402::PaymentContext) in the request extensions,
//!   readable with [`payment_context`] or the [`VerifiedPayment`] extractor
//!
//! For verification through a remote facilitator, wrap a
//! [`FacilitatorClient`] in a [`FacilitatorVerifier`](pay402::FacilitatorVerifier)
//! and pass it to [`PaymentMiddleware::with_verifier`].

pub mod context;
pub mod error;
pub mod facilitator_client;
pub mod layer;
pub mod paygate;

pub use context::{MissingPaymentContext, VerifiedPayment, payment_context};
pub use error::PaygateError;
pub use facilitator_client::{FacilitatorClient, FacilitatorClientError};
pub use layer::{PaymentMiddleware, PaymentService};
pub use paygate::{
    NonceGenerator, OnPaymentRequired, OnPaymentVerified, Paygate, payment_required_response,
};
