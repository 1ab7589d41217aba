//! Payment handlers: the client-side hook that turns requirements into a payment.

use pay402::error::BoxError;
use pay402::{Payment, PaymentRequirements};

/// Produces a [`Payment`] for a set of [`PaymentRequirements`].
///
/// This is where a wallet signs and submits the transfer. Any
/// `Fn(&PaymentRequirements) -> Result<Payment, E>` closure is a handler.
#[async_trait::async_trait]
pub trait PaymentHandler: Send + Sync {
    /// Pays according to `requirements`.
    async fn pay(&self, requirements: &PaymentRequirements) -> Result<Payment, BoxError>;
}

#[async_trait::async_trait]
impl<F, E> PaymentHandler for F
where
    F: Fn(&PaymentRequirements) -> Result<Payment, E> + Send + Sync,
    E: Into<BoxError> + 'static,
{
    async fn pay(&self, requirements: &PaymentRequirements) -> Result<Payment, BoxError> {
        self(requirements).map_err(Into::into)
    }
}
