//! Error types for the payment gate.
//!
//! Every failure of the gate is terminal for the request and is answered
//! directly by the gate; the protected handler is never called.

use axum_core::response::{IntoResponse, Response};
use http::StatusCode;
use pay402::VerifierError;

use crate::error::HttpError;

/// Reasons the payment gate refuses a request.
#[derive(Debug, thiserror::Error)]
pub enum PaygateError {
    /// The request carries no payment.
    #[error("Payment Required")]
    PaymentRequired,

    /// The payment header is present but does not decode.
    #[error("Invalid payment format")]
    InvalidPaymentHeader(#[source] HttpError),

    /// The verifier checked the payment and rejected it.
    #[error("Payment verification failed")]
    Rejected,

    /// The verifier could not check the payment.
    #[error("Payment verification failed: {0}")]
    Verifier(#[source] VerifierError),
}

impl PaygateError {
    /// HTTP status the gate answers with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PaymentRequired | Self::Rejected => StatusCode::PAYMENT_REQUIRED,
            Self::InvalidPaymentHeader(_) | Self::Verifier(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Plain-text response carrying the error message.
///
/// [`PaygateError::PaymentRequired`] converts to a bare 402 here; the gate
/// itself answers it with the full requirements response instead.
impl IntoResponse for PaygateError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_failure_kind() {
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(PaygateError::PaymentRequired.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(PaygateError::Rejected.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            PaygateError::InvalidPaymentHeader(HttpError::Json(json_err)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PaygateError::Verifier(VerifierError::MissingField("txHash")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn verifier_error_is_included_in_message() {
        let err = PaygateError::Verifier(VerifierError::MissingField("txHash"));
        assert_eq!(err.to_string(), "Payment verification failed: payment is missing txHash");
    }
}
