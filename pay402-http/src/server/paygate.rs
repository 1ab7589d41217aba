//! Core payment gate logic.
//!
//! The [`Paygate`] struct runs the per-request state machine: it reads the
//! `X-Payment-Response` header, hands the payment to the configured
//! [`PaymentVerifier`], and either answers the request itself or forwards it
//! to the protected service with a [`PaymentContext`] attached.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::{IntoResponse, Response};
use http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{HeaderMap, HeaderValue, StatusCode};
use pay402::{Payment, PaymentContext, PaymentRequirements, PaymentVerifier};
use serde_json::json;
use tower::{Service, ServiceExt};

#[cfg(feature = "telemetry")]
use tracing::{Instrument, debug, instrument, warn};

use super::error::PaygateError;
use crate::constants::{WWW_AUTHENTICATE_VALUE, X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER};
use crate::error::HttpError;
use crate::headers;

/// Callback run after a payment is verified, before the protected service.
pub type OnPaymentVerified = Arc<dyn Fn(&Payment, &Request) + Send + Sync>;

/// Callback producing the response for a request that carries no payment.
///
/// Receives the configured requirements as given, without a generated nonce
/// or expiry.
pub type OnPaymentRequired = Arc<dyn Fn(&Request, &PaymentRequirements) -> Response + Send + Sync>;

/// Produces a fresh nonce for each 402 response.
pub type NonceGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Payment gate shared by every request passing through a
/// [`PaymentService`](super::PaymentService).
#[derive(Clone)]
pub struct Paygate {
    pub(crate) requirements: PaymentRequirements,
    pub(crate) verifier: Arc<dyn PaymentVerifier>,
    pub(crate) nonce_generator: NonceGenerator,
    pub(crate) expiry: Duration,
    pub(crate) on_payment_verified: Option<OnPaymentVerified>,
    pub(crate) on_payment_required: Option<OnPaymentRequired>,
}

impl fmt::Debug for Paygate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paygate")
            .field("requirements", &self.requirements)
            .field("expiry", &self.expiry)
            .field("on_payment_verified", &self.on_payment_verified.is_some())
            .field("on_payment_required", &self.on_payment_required.is_some())
            .finish_non_exhaustive()
    }
}

impl Paygate {
    /// Returns the configured requirements.
    #[must_use]
    pub const fn requirements(&self) -> &PaymentRequirements {
        &self.requirements
    }

    /// Handles an incoming request, enforcing payment.
    ///
    /// Requests without a payment get the 402 requirements response, bad or
    /// rejected payments get the matching [`PaygateError`] response, and
    /// verified requests are forwarded to `inner` with a [`PaymentContext`]
    /// in their extensions.
    ///
    /// # Errors
    ///
    /// This method is infallible (`Infallible` error type).
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "pay402.paygate.handle_request", skip_all, fields(path = %req.uri().path()))
    )]
    pub async fn handle_request<S>(&self, inner: S, mut req: Request) -> Result<Response, Infallible>
    where
        S: Service<Request, Response = Response, Error = Infallible>,
        S::Future: Send,
    {
        let payment = match self.verify_headers(req.headers()).await {
            Ok(payment) => payment,
            Err(PaygateError::PaymentRequired) => {
                #[cfg(feature = "telemetry")]
                debug!("No payment provided, answering 402");
                return Ok(self.payment_required(&req));
            }
            Err(err) => {
                #[cfg(feature = "telemetry")]
                warn!(error = %err, "Payment refused");
                return Ok(err.into_response());
            }
        };

        #[cfg(feature = "telemetry")]
        debug!(tx_hash = %payment.tx_hash, sender = %payment.sender, "Payment verified");

        if let Some(callback) = &self.on_payment_verified {
            callback(&payment, &req);
        }
        req.extensions_mut().insert(PaymentContext::verified(payment));

        call_inner(inner, req).await
    }

    /// Decodes and verifies the payment carried by `header_map`.
    ///
    /// A blank header counts as no payment.
    ///
    /// # Errors
    ///
    /// Returns the [`PaygateError`] describing why the payment is refused.
    pub async fn verify_headers(&self, header_map: &HeaderMap) -> Result<Payment, PaygateError> {
        let value = header_map
            .get(X_PAYMENT_RESPONSE_HEADER)
            .ok_or(PaygateError::PaymentRequired)?;
        let payment = headers::decode_payment(value.as_bytes()).map_err(|err| match err {
            HttpError::EmptyHeader(_) => PaygateError::PaymentRequired,
            other @ HttpError::Json(_) => PaygateError::InvalidPaymentHeader(other),
        })?;

        let valid = self
            .verifier
            .verify(&payment, &self.requirements)
            .await
            .map_err(PaygateError::Verifier)?;
        if valid {
            Ok(payment)
        } else {
            Err(PaygateError::Rejected)
        }
    }

    /// Builds the response for a request that carries no payment.
    fn payment_required(&self, req: &Request) -> Response {
        if let Some(callback) = &self.on_payment_required {
            return callback(req, &self.requirements);
        }
        let requirements = self
            .requirements
            .with_defaults(|| (self.nonce_generator)(), self.expiry);
        payment_required_response(&requirements)
    }
}

/// Calls the protected service.
async fn call_inner<S>(inner: S, req: Request) -> Result<Response, Infallible>
where
    S: Service<Request, Response = Response, Error = Infallible>,
    S::Future: Send,
{
    #[cfg(feature = "telemetry")]
    {
        inner
            .oneshot(req)
            .instrument(tracing::info_span!("inner"))
            .await
    }
    #[cfg(not(feature = "telemetry"))]
    {
        inner.oneshot(req).await
    }
}

/// Builds a `402 Payment Required` response advertising `requirements`.
///
/// The requirements go in the `X-Payment` header and, together with an
/// `"error"` message, in the JSON body. Answers 500 if the requirements
/// cannot be encoded.
#[must_use]
pub fn payment_required_response(requirements: &PaymentRequirements) -> Response {
    let header = headers::encode_payment_requirements(requirements)
        .ok()
        .and_then(|json| HeaderValue::from_str(&json).ok());
    let Some(header) = header else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate payment requirements",
        )
            .into_response();
    };
    let body = json!({
        "error": "Payment Required",
        "payment": requirements,
    });

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = StatusCode::PAYMENT_REQUIRED;
    let headers = response.headers_mut();
    headers.insert(X_PAYMENT_HEADER, header);
    headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static(WWW_AUTHENTICATE_VALUE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use pay402::UnixTimestamp;

    #[test]
    fn payment_required_response_carries_requirements() {
        let requirements = PaymentRequirements::exact("1000", "0xToken", "8453", "0xRecipient")
            .with_nonce("n1")
            .with_expiry(UnixTimestamp::from_secs(1_700_000_000));
        let response = payment_required_response(&requirements);

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "X-Payment");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let header = response.headers()[X_PAYMENT_HEADER].as_bytes();
        assert_eq!(headers::decode_payment_requirements(header).unwrap(), requirements);
    }
}
