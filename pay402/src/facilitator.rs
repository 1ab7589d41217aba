//! Core trait for payment verification and settlement services.
//!
//! A facilitator checks a payment transaction on behalf of a resource server
//! and settles it afterwards. Implementations may run in-process or be a
//! remote HTTP service (see `pay402-http`'s `FacilitatorClient`).

use std::sync::Arc;

use crate::proto::{SettleRequest, SettleResponse, VerifyRequest, VerifyResponse};

/// Verifies and settles payments.
#[async_trait::async_trait]
pub trait Facilitator: Send + Sync {
    /// Error returned when the facilitator cannot produce an answer.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Checks whether a payment transaction is valid.
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Self::Error>;

    /// Settles a payment.
    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Self::Error>;
}

#[async_trait::async_trait]
impl<T> Facilitator for Arc<T>
where
    T: Facilitator + ?Sized,
{
    type Error = T::Error;

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Self::Error> {
        (**self).verify(request).await
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Self::Error> {
        (**self).settle(request).await
    }
}
