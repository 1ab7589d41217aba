//! Client-side payment handling for reqwest.
//!
//! This module provides the [`X402Client`] middleware which answers a
//! `402 Payment Required` with a single paid retry.

use std::sync::Arc;

use http::{Extensions, HeaderValue, StatusCode};
use pay402::{Payment, PaymentRequirements};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

use super::error::ClientError;
use super::handler::PaymentHandler;
use crate::constants::{X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER};
use crate::error::HttpError;
use crate::headers;

/// Middleware that pays for `402 Payment Required` responses.
///
/// On a 402, the middleware reads the `X-Payment` requirements, asks the
/// registered [`PaymentHandler`] for a payment and re-sends the original
/// request once with the payment in `X-Payment-Response`. Whatever the
/// retried request returns is handed back to the caller, including a second
/// 402.
#[derive(Clone)]
pub struct X402Client {
    handler: Option<Arc<dyn PaymentHandler>>,
    max_retries: u32,
}

impl std::fmt::Debug for X402Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Client")
            .field("handler", &self.handler.is_some())
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for X402Client {
    fn default() -> Self {
        Self {
            handler: None,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }
}

impl X402Client {
    /// Default value of [`X402Client::max_retries`].
    pub const DEFAULT_MAX_RETRIES: u32 = 1;

    /// Creates a client without a payment handler.
    ///
    /// Any 402 response then fails with [`ClientError::NoPaymentHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client that pays with `handler`.
    #[must_use]
    pub fn with_handler<H>(handler: H) -> Self
    where
        H: PaymentHandler + 'static,
    {
        Self::new().handler(handler)
    }

    /// Sets the payment handler.
    #[must_use]
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: PaymentHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets the maximum number of payment attempts.
    ///
    /// Only a single payment round is performed regardless of this value.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the configured maximum number of payment attempts.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Builds the `X-Payment-Response` header value for a 402 response.
    ///
    /// Extracts the requirements, calls the payment handler and encodes the
    /// resulting payment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingRequirementsHeader`] or
    /// [`ClientError::InvalidRequirements`] if the response carries no usable
    /// requirements, [`ClientError::NoPaymentHandler`] or
    /// [`ClientError::PaymentHandler`] if no payment could be produced, and
    /// [`ClientError::EncodePayment`] if the payment cannot be put in a header.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "pay402.reqwest.make_payment_header", skip_all, err)
    )]
    pub async fn make_payment_header(&self, res: &Response) -> Result<HeaderValue, ClientError> {
        let requirements = parse_payment_requirements(res)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %requirements.scheme,
            chain = %requirements.chain,
            amount = %requirements.amount,
            "Parsed payment requirements"
        );

        let handler = self.handler.as_ref().ok_or(ClientError::NoPaymentHandler)?;
        let payment = handler
            .pay(&requirements)
            .await
            .map_err(ClientError::PaymentHandler)?;

        #[cfg(feature = "telemetry")]
        debug!(tx_hash = %payment.tx_hash, "Payment handler produced payment");

        payment_header_value(&payment)
    }
}

/// Encodes a payment as a header value.
fn payment_header_value(payment: &Payment) -> Result<HeaderValue, ClientError> {
    let json = headers::encode_payment(payment).map_err(|e| ClientError::EncodePayment(e.into()))?;
    HeaderValue::from_str(&json).map_err(|e| ClientError::EncodePayment(e.into()))
}

/// Runs the next middleware or HTTP client with optional telemetry instrumentation.
#[cfg_attr(feature = "telemetry", instrument(name = "pay402.reqwest.next", skip_all))]
async fn run_next(
    next: rqm::Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> rqm::Result<Response> {
    next.run(req, extensions).await
}

#[async_trait::async_trait]
impl rqm::Middleware for X402Client {
    /// Handles a request, paying and retrying once on a 402 response.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "pay402.reqwest.handle", skip_all, err)
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = run_next(next.clone(), req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "Received 402 Payment Required, processing payment");

        // Fail before paying if the request cannot be sent a second time.
        let mut retry = retry_req.ok_or_else(|| {
            rqm::Error::Middleware(ClientError::RequestNotCloneable.into())
        })?;

        let header = self
            .make_payment_header(&res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;
        retry.headers_mut().insert(X_PAYMENT_RESPONSE_HEADER, header);

        #[cfg(feature = "telemetry")]
        trace!(url = %retry.url(), "Retrying request with {X_PAYMENT_RESPONSE_HEADER} header");

        run_next(next, retry, extensions)
            .await
            .map_err(|e| rqm::Error::Middleware(ClientError::Retry(e).into()))
    }
}

/// Extracts [`PaymentRequirements`] from the `X-Payment` header of a 402 response.
///
/// A blank header counts as missing.
///
/// # Errors
///
/// Returns [`ClientError::MissingRequirementsHeader`] if the header is
/// absent or blank, and [`ClientError::InvalidRequirements`] if it does not
/// decode.
pub fn parse_payment_requirements(response: &Response) -> Result<PaymentRequirements, ClientError> {
    let value = response
        .headers()
        .get(X_PAYMENT_HEADER)
        .ok_or(ClientError::MissingRequirementsHeader(X_PAYMENT_HEADER))?;
    headers::decode_payment_requirements(value.as_bytes()).map_err(|err| match err {
        HttpError::EmptyHeader(name) => ClientError::MissingRequirementsHeader(name),
        other @ HttpError::Json(_) => ClientError::InvalidRequirements(other),
    })
}
