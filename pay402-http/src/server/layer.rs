//! Tower layer enforcing payment on protected routes.
//!
//! ```ignore
//! let paywall = PaymentMiddleware::new(PaymentRequirements::exact(
//!     "1000000", "0xToken", "8453", "0xRecipient",
//! ))
//! .with_expiry(Duration::from_secs(120));
//!
//! let app = Router::new().route("/premium", get(premium).layer(paywall));
//! ```
//!
//! ## Configuration Notes
//!
//! - **[`PaymentMiddleware::with_verifier`]** replaces the default
//!   [`FieldMatchVerifier`], which only compares fields and proves nothing
//!   about the transaction.
//! - **[`PaymentMiddleware::with_expiry`]** sets how long advertised
//!   requirements stay payable (default: 5 minutes).
//! - **[`PaymentMiddleware::with_nonce_generator`]** replaces the random
//!   nonce used when the requirements carry none.
//! - **[`PaymentMiddleware::on_payment_verified`]** and
//!   **[`PaymentMiddleware::on_payment_required`]** hook into the two
//!   outcomes of the gate.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum_core::extract::Request;
use axum_core::response::Response;
use pay402::nonce::generate_nonce;
use pay402::{FieldMatchVerifier, Payment, PaymentRequirements, PaymentVerifier};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use super::paygate::Paygate;

/// Payment gate configuration, usable as a tower [`Layer`].
///
/// Every layered service shares the same configuration; each request gets
/// its own pass through the gate.
#[derive(Clone)]
pub struct PaymentMiddleware {
    gate: Paygate,
}

impl fmt::Debug for PaymentMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentMiddleware")
            .field("gate", &self.gate)
            .finish()
    }
}

impl PaymentMiddleware {
    /// Default lifetime of advertised requirements.
    pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(5 * 60);

    /// Creates a gate demanding `requirements`, verified with
    /// [`FieldMatchVerifier`].
    #[must_use]
    pub fn new(requirements: PaymentRequirements) -> Self {
        Self {
            gate: Paygate {
                requirements,
                verifier: Arc::new(FieldMatchVerifier),
                nonce_generator: Arc::new(generate_nonce),
                expiry: Self::DEFAULT_EXPIRY,
                on_payment_verified: None,
                on_payment_required: None,
            },
        }
    }

    /// Returns the configured requirements.
    #[must_use]
    pub const fn requirements(&self) -> &PaymentRequirements {
        self.gate.requirements()
    }

    /// Returns how long advertised requirements stay payable.
    #[must_use]
    pub const fn expiry(&self) -> Duration {
        self.gate.expiry
    }

    /// Sets the payment verifier.
    #[must_use]
    pub fn with_verifier<V>(mut self, verifier: V) -> Self
    where
        V: PaymentVerifier + 'static,
    {
        self.gate.verifier = Arc::new(verifier);
        self
    }

    /// Sets how long advertised requirements stay payable.
    ///
    /// Only applies when the requirements carry no expiry of their own.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: Duration) -> Self {
        self.gate.expiry = expiry;
        self
    }

    /// Sets the nonce generator.
    ///
    /// Only applies when the requirements carry no nonce of their own.
    #[must_use]
    pub fn with_nonce_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.gate.nonce_generator = Arc::new(generator);
        self
    }

    /// Registers a callback run for every verified payment, before the
    /// protected service is called.
    #[must_use]
    pub fn on_payment_verified<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Payment, &Request) + Send + Sync + 'static,
    {
        self.gate.on_payment_verified = Some(Arc::new(callback));
        self
    }

    /// Replaces the 402 response sent to requests without a payment.
    ///
    /// The callback's response is sent as is; no requirements header is
    /// added.
    #[must_use]
    pub fn on_payment_required<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request, &PaymentRequirements) -> Response + Send + Sync + 'static,
    {
        self.gate.on_payment_required = Some(Arc::new(callback));
        self
    }
}

impl<S> Layer<S> for PaymentMiddleware
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = PaymentService;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentService {
            gate: Arc::new(self.gate.clone()),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Service that enforces payment before calling the wrapped service.
#[derive(Clone)]
#[allow(missing_debug_implementations)] // BoxCloneSyncService does not implement Debug
pub struct PaymentService {
    /// Shared gate configuration
    gate: Arc<Paygate>,
    /// The wrapped service
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl Service<Request> for PaymentService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    /// Delegates readiness polling to the wrapped inner service.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = Arc::clone(&self.gate);
        let inner = self.inner.clone();
        Box::pin(async move { gate.handle_request(inner, req).await })
    }
}
