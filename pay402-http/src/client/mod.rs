//! Reqwest middleware for automatic 402 payment handling.
//!
//! The [`X402Client`] middleware watches responses for
//! `402 Payment Required`. When one arrives it decodes the `X-Payment`
//! requirements, asks a [`PaymentHandler`] to pay, and re-sends the request
//! once with the payment in `X-Payment-Response`.
//!
//! There are two ways to use it:
//!
//! - Add [`X402Client`] to an existing `reqwest_middleware` stack, or call
//!   [`ReqwestWithPayments::with_payments`] on a `reqwest` client/builder.
//! - Use [`PaymentClient`], which owns such a stack and reports failures as
//!   [`ClientError`] instead of `reqwest_middleware::Error`.
//!
//! Only requests whose body can be cloned (anything but a stream) can be
//! retried; a 402 for any other request fails with
//! [`ClientError::RequestNotCloneable`] without calling the handler.

mod error;
mod handler;
mod middleware;

pub use error::ClientError;
pub use handler::PaymentHandler;
pub use middleware::{X402Client, parse_payment_requirements};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, IntoUrl, Request, Response};
use reqwest_middleware as rqm;

/// Trait for adding payment handling to reqwest clients.
///
/// Implemented on [`Client`] and [`ClientBuilder`].
pub trait ReqwestWithPayments<A> {
    /// Adds the [`X402Client`] middleware to the client or builder.
    fn with_payments(self, x402_client: X402Client) -> ReqwestWithPaymentsBuilder<A>;
}

impl ReqwestWithPayments<Self> for Client {
    fn with_payments(self, x402_client: X402Client) -> ReqwestWithPaymentsBuilder<Self> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            x402_client,
        }
    }
}

impl ReqwestWithPayments<Self> for ClientBuilder {
    fn with_payments(self, x402_client: X402Client) -> ReqwestWithPaymentsBuilder<Self> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            x402_client,
        }
    }
}

/// Builder for creating a reqwest client with the payment middleware.
#[allow(missing_debug_implementations)] // ClientBuilder does not implement Debug
pub struct ReqwestWithPaymentsBuilder<A> {
    inner: A,
    x402_client: X402Client,
}

impl ReqwestWithPaymentsBuilder<Client> {
    /// Returns the middleware client builder with [`X402Client`] registered.
    #[must_use]
    pub fn builder(self) -> rqm::ClientBuilder {
        rqm::ClientBuilder::new(self.inner).with(self.x402_client)
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> rqm::ClientWithMiddleware {
        self.builder().build()
    }
}

impl ReqwestWithPaymentsBuilder<ClientBuilder> {
    /// Builds the inner client and returns the middleware client builder.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] raised while building the inner client.
    pub fn builder(self) -> Result<rqm::ClientBuilder, reqwest::Error> {
        let client = self.inner.build()?;
        Ok(rqm::ClientBuilder::new(client).with(self.x402_client))
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] raised while building the inner client.
    pub fn build(self) -> Result<rqm::ClientWithMiddleware, reqwest::Error> {
        Ok(self.builder()?.build())
    }
}

/// HTTP client that pays for 402 responses.
///
/// A thin wrapper over a `reqwest_middleware` client carrying an
/// [`X402Client`]. Responses other than 402 pass through untouched.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    inner: rqm::ClientWithMiddleware,
}

impl PaymentClient {
    /// Creates a client around a fresh [`reqwest::Client`].
    #[must_use]
    pub fn new(x402_client: X402Client) -> Self {
        Self::with_client(Client::new(), x402_client)
    }

    /// Creates a client that pays with `handler`.
    #[must_use]
    pub fn with_handler<H>(handler: H) -> Self
    where
        H: PaymentHandler + 'static,
    {
        Self::new(X402Client::with_handler(handler))
    }

    /// Creates a client around an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: Client, x402_client: X402Client) -> Self {
        Self {
            inner: client.with_payments(x402_client).build(),
        }
    }

    /// Returns the underlying middleware client.
    #[must_use]
    pub const fn inner(&self) -> &rqm::ClientWithMiddleware {
        &self.inner
    }

    /// Executes a request, paying and retrying once on 402.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] naming the step that failed.
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        self.inner
            .execute(request)
            .await
            .map_err(ClientError::from_middleware)
    }

    /// Performs a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] naming the step that failed.
    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<Response, ClientError> {
        self.inner
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_middleware)
    }

    /// Performs a `POST` request with the given content type and body.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] naming the step that failed.
    pub async fn post<U, B>(
        &self,
        url: U,
        content_type: &str,
        body: B,
    ) -> Result<Response, ClientError>
    where
        U: IntoUrl,
        B: Into<reqwest::Body>,
    {
        self.inner
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(ClientError::from_middleware)
    }
}
