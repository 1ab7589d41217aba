//! A [`pay402::Facilitator`] implementation that talks to a _remote_
//! facilitator over HTTP.
//!
//! [`FacilitatorClient`] handles the `/verify`, `/settle` and `/health`
//! endpoints and can back a [`FacilitatorVerifier`](pay402::FacilitatorVerifier)
//! inside the payment gate.
//!
//! ## Error Handling
//!
//! [`FacilitatorClientError`] keeps the failure kinds apart:
//! - URL construction
//! - HTTP transport failures
//! - JSON deserialization errors
//! - Non-200 HTTP status responses (carrying the response body)
//!
//! Requests are never retried.

use std::fmt::Display;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use pay402::{
    Facilitator, HealthResponse, SettleRequest, SettleResponse, VerifyRequest, VerifyResponse,
};
use reqwest::{Client, RequestBuilder};
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

/// A client for communicating with a remote facilitator.
#[derive(Clone, Debug)]
pub struct FacilitatorClient {
    /// Base URL of the facilitator (e.g. `https://facilitator.example/`)
    base_url: Url,
    /// Full URL of `POST /verify`
    verify_url: Url,
    /// Full URL of `POST /settle`
    settle_url: Url,
    /// Full URL of `GET /health`
    health_url: Url,
    /// Shared reqwest client
    client: Client,
    /// Custom headers sent with each request
    headers: HeaderMap,
    /// Optional per-request timeout
    timeout: Option<Duration>,
}

/// Errors that can occur while interacting with a remote facilitator.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Non-200 HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

fn join(
    base_url: &Url,
    path: &'static str,
    context: &'static str,
) -> Result<Url, FacilitatorClientError> {
    base_url
        .join(path)
        .map_err(|source| FacilitatorClientError::UrlParse { context, source })
}

impl FacilitatorClient {
    /// Constructs a client from a base URL.
    ///
    /// Endpoint URLs are resolved relative to the base (`./verify`,
    /// `./settle`, `./health`), so a base path must end with `/` to be kept.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorClientError::UrlParse`] if an endpoint URL cannot
    /// be built.
    pub fn try_new(base_url: Url) -> Result<Self, FacilitatorClientError> {
        let verify_url = join(&base_url, "./verify", "Failed to construct ./verify URL")?;
        let settle_url = join(&base_url, "./settle", "Failed to construct ./settle URL")?;
        let health_url = join(&base_url, "./health", "Failed to construct ./health URL")?;
        Ok(Self {
            base_url,
            verify_url,
            settle_url,
            health_url,
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Returns the base URL used by this client.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the computed `./verify` URL.
    pub const fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    /// Returns the computed `./settle` URL.
    pub const fn settle_url(&self) -> &Url {
        &self.settle_url
    }

    /// Returns the computed `./health` URL.
    pub const fn health_url(&self) -> &Url {
        &self.health_url
    }

    /// Returns the custom headers configured on the client.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the configured timeout, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attaches custom headers to all future requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses `client` for all future requests.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sends a `POST /verify` request to the facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorClientError`] if the request fails or the
    /// facilitator answers with a non-200 status.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "pay402.facilitator_client.verify",
            skip_all,
            fields(tx_hash = %request.tx_hash, otel.status_code, error.message)
        )
    )]
    pub async fn verify(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerifyResponse, FacilitatorClientError> {
        let builder = self.client.post(self.verify_url.clone()).json(request);
        self.send_json(builder, "POST /verify").await
    }

    /// Sends a `POST /settle` request to the facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorClientError`] if the request fails or the
    /// facilitator answers with a non-200 status.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "pay402.facilitator_client.settle",
            skip_all,
            fields(tx_hash = %request.payment.tx_hash, otel.status_code, error.message)
        )
    )]
    pub async fn settle(
        &self,
        request: &SettleRequest,
    ) -> Result<SettleResponse, FacilitatorClientError> {
        let builder = self.client.post(self.settle_url.clone()).json(request);
        self.send_json(builder, "POST /settle").await
    }

    /// Sends a `GET /health` request to the facilitator.
    ///
    /// # Errors
    ///
    /// Returns [`FacilitatorClientError`] if the request fails or the
    /// facilitator answers with a non-200 status.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "pay402.facilitator_client.health",
            skip_all,
            fields(otel.status_code, error.message)
        )
    )]
    pub async fn health(&self) -> Result<HealthResponse, FacilitatorClientError> {
        let builder = self.client.get(self.health_url.clone());
        self.send_json(builder, "GET /health").await
    }

    /// Applies headers and timeout, sends the request and decodes a 200 JSON
    /// answer.
    ///
    /// `context` names the endpoint in errors and traces (e.g. `"POST /verify"`).
    async fn send_json<R>(
        &self,
        mut builder: RequestBuilder,
        context: &'static str,
    ) -> Result<R, FacilitatorClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http_response = builder
            .send()
            .await
            .map_err(|source| FacilitatorClientError::Http { context, source })?;

        let result = if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|source| FacilitatorClientError::JsonDeserialization { context, source })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|source| FacilitatorClientError::ResponseBodyRead { context, source })?;
            Err(FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            })
        };

        record_result_on_span(&result);

        result
    }
}

#[async_trait::async_trait]
impl Facilitator for FacilitatorClient {
    type Error = FacilitatorClientError;

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Self::Error> {
        Self::verify(self, request).await
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Self::Error> {
        Self::settle(self, request).await
    }
}

/// Parses a base URL, normalizing it to a single trailing slash.
impl TryFrom<&str> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_owned();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|source| FacilitatorClientError::UrlParse {
            context: "Failed to parse base url",
            source,
        })?;
        Self::try_new(url)
    }
}

impl TryFrom<String> for FacilitatorClient {
    type Error = FacilitatorClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to facilitator failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
const fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pay402::{Payment, PaymentRequirements, UnixTimestamp};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payment() -> Payment {
        let requirements = PaymentRequirements::exact("1000", "0xToken", "8453", "0xRecipient");
        Payment::for_requirements(&requirements, "0xabc", "0xSender")
    }

    fn client_for(server: &MockServer) -> FacilitatorClient {
        FacilitatorClient::try_from(server.uri()).unwrap()
    }

    #[test]
    fn endpoints_are_relative_to_normalized_base() {
        let client = FacilitatorClient::try_from("https://facilitator.example/api//").unwrap();
        assert_eq!(client.base_url().as_str(), "https://facilitator.example/api/");
        assert_eq!(client.verify_url().as_str(), "https://facilitator.example/api/verify");
        assert_eq!(client.settle_url().as_str(), "https://facilitator.example/api/settle");
        assert_eq!(client.health_url().as_str(), "https://facilitator.example/api/health");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = FacilitatorClient::try_from("not a url").unwrap_err();
        assert!(matches!(err, FacilitatorClientError::UrlParse { .. }));
    }

    #[tokio::test]
    async fn verify_posts_request_and_decodes_response() {
        let server = MockServer::start().await;
        let request = VerifyRequest::from(&payment());
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(body_json(serde_json::json!({"txHash": "0xabc", "chain": "8453"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "txHash": "0xabc",
                "chain": "8453",
                "token": "0xToken",
                "amount": "1000",
                "sender": "0xSender",
                "recipient": "0xRecipient"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).verify(&request).await.unwrap();
        assert!(response.valid);
        assert_eq!(response.sender, "0xSender");
        assert_eq!(response.error, None);
    }

    #[tokio::test]
    async fn settle_through_trait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "settled": true,
                "txHash": "0xabc",
                "timestamp": 1_700_000_000
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = Facilitator::settle(&client, &SettleRequest { payment: payment() })
            .await
            .unwrap();
        assert!(response.settled);
        assert_eq!(response.timestamp, Some(UnixTimestamp::from_secs(1_700_000_000)));
    }

    #[tokio::test]
    async fn non_200_is_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string(r#"{"error":"chain unreachable"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .verify(&VerifyRequest::from(&payment()))
            .await
            .unwrap_err();
        match err {
            FacilitatorClientError::HttpStatus {
                context,
                status,
                body,
            } => {
                assert_eq!(context, "POST /verify");
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, r#"{"error":"chain unreachable"}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let err = client_for(&server).health().await.unwrap_err();
        assert!(matches!(err, FacilitatorClientError::JsonDeserialization { .. }));
    }

    #[tokio::test]
    async fn custom_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "ok", "version": "1.2.3"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        let client = client_for(&server)
            .with_headers(headers)
            .with_timeout(Duration::from_secs(5));
        let health = client.health().await.unwrap();
        assert_eq!(health, HealthResponse::ok("1.2.3"));
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn transport_failure_is_http_error() {
        let client = FacilitatorClient::try_from("http://127.0.0.1:1").unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, FacilitatorClientError::Http { .. }));
    }
}
