//! Errors produced by the paying client.

use pay402::error::BoxError;
use reqwest_middleware as rqm;

use crate::error::HttpError;

/// Errors that can occur while handling a 402 response.
///
/// Each failure of the payment round has its own variant; none of them is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The 402 response carried no payment requirements.
    #[error("402 response missing {0} header")]
    MissingRequirementsHeader(&'static str),

    /// The payment requirements header could not be decoded.
    #[error("failed to parse payment requirements: {0}")]
    InvalidRequirements(#[source] HttpError),

    /// A 402 was received but no payment handler is registered.
    #[error("payment required but no payment handler configured")]
    NoPaymentHandler,

    /// The payment handler failed to produce a payment.
    #[error("payment handler failed: {0}")]
    PaymentHandler(#[source] BoxError),

    /// The payment could not be encoded into a header value.
    #[error("failed to encode payment: {0}")]
    EncodePayment(#[source] BoxError),

    /// The original request has a streaming body and cannot be re-sent.
    #[error("request body is not cloneable, cannot retry with payment")]
    RequestNotCloneable,

    /// The request carrying the payment failed in transport.
    #[error("retried request failed: {0}")]
    Retry(#[source] rqm::Error),

    /// The initial request failed in transport.
    #[error("request failed: {0}")]
    Transport(#[source] rqm::Error),
}

impl ClientError {
    /// Recovers a [`ClientError`] raised inside the middleware stack.
    ///
    /// Errors produced by [`X402Client`](super::X402Client) travel through
    /// `reqwest_middleware` as opaque middleware errors; everything else is
    /// reported as [`ClientError::Transport`].
    #[must_use]
    pub fn from_middleware(err: rqm::Error) -> Self {
        match err {
            rqm::Error::Middleware(inner) => match inner.downcast::<Self>() {
                Ok(client_error) => client_error,
                Err(inner) => Self::Transport(rqm::Error::Middleware(inner)),
            },
            other => Self::Transport(other),
        }
    }
}
