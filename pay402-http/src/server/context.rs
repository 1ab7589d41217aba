//! Access to the verified payment from inside a protected handler.

use axum_core::extract::FromRequestParts;
use axum_core::response::{IntoResponse, Response};
use http::StatusCode;
use http::request::Parts;
use pay402::PaymentContext;

/// Returns the payment context attached by the payment gate, if any.
#[must_use]
pub fn payment_context<B>(req: &http::Request<B>) -> Option<&PaymentContext> {
    req.extensions().get::<PaymentContext>()
}

/// Extractor for the [`PaymentContext`] of a request that passed the gate.
///
/// ```ignore
/// async fn premium(VerifiedPayment(ctx): VerifiedPayment) -> String {
///     format!("thanks, {}", ctx.payment.sender)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment(pub PaymentContext);

/// Rejection used when a handler asks for a payment on an unprotected route.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("Payment context missing")]
pub struct MissingPaymentContext;

impl IntoResponse for MissingPaymentContext {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

impl<S> FromRequestParts<S> for VerifiedPayment
where
    S: Send + Sync,
{
    type Rejection = MissingPaymentContext;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PaymentContext>()
            .cloned()
            .map(Self)
            .ok_or(MissingPaymentContext)
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use pay402::{Payment, PaymentRequirements};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn payment_context_reads_extensions() {
        let mut req = http::Request::new(());
        assert!(payment_context(&req).is_none());

        let requirements = PaymentRequirements::exact("1", "0xToken", "8453", "0xRecipient");
        let payment = Payment::for_requirements(&requirements, "0xtx", "0xSender");
        req.extensions_mut().insert(PaymentContext::verified(payment.clone()));
        let ctx = payment_context(&req).unwrap();
        assert!(ctx.verified);
        assert_eq!(ctx.payment, payment);
    }

    #[tokio::test]
    async fn extractor_rejects_unprotected_route() {
        let app = Router::new().route(
            "/open",
            get(|VerifiedPayment(ctx): VerifiedPayment| async move { ctx.payment.tx_hash }),
        );
        let response = app
            .oneshot(http::Request::get("/open").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
