//! Axum route handlers for the facilitator service.
//!
//! Any [`Facilitator`] can be served; the router is a stateless proxy in
//! front of it and never retries.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use pay402::{
    Facilitator, HealthResponse, SettleRequest, SettleResponse, VerifyRequest, VerifyResponse,
};
use serde::de::DeserializeOwned;

use crate::error::FacilitatorError;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, FacilitatorError> {
    serde_json::from_slice(body).map_err(FacilitatorError::InvalidBody)
}

/// `POST /verify` - Checks a payment transaction.
///
/// # Errors
///
/// Returns 400 on an undecodable body, or 500 if the facilitator fails.
pub async fn post_verify<F>(
    State(facilitator): State<Arc<F>>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, FacilitatorError>
where
    F: Facilitator + 'static,
{
    let request: VerifyRequest = parse_body(&body)?;
    tracing::debug!(tx_hash = %request.tx_hash, chain = %request.chain, "Verify request");
    let response = facilitator
        .verify(&request)
        .await
        .map_err(FacilitatorError::facilitator)?;
    Ok(Json(response))
}

/// `POST /settle` - Settles a payment.
///
/// # Errors
///
/// Returns 400 on an undecodable body, or 500 if the facilitator fails.
pub async fn post_settle<F>(
    State(facilitator): State<Arc<F>>,
    body: Bytes,
) -> Result<Json<SettleResponse>, FacilitatorError>
where
    F: Facilitator + 'static,
{
    let request: SettleRequest = parse_body(&body)?;
    tracing::debug!(tx_hash = %request.payment.tx_hash, "Settle request");
    let response = facilitator
        .settle(&request)
        .await
        .map_err(FacilitatorError::facilitator)?;
    Ok(Json(response))
}

/// `GET /health` - Reports the service as up.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(env!("CARGO_PKG_VERSION")))
}

/// Creates an Axum [`Router`] serving `facilitator`.
///
/// Endpoints:
/// - `POST /verify` - verify a payment transaction
/// - `POST /settle` - settle a payment
/// - `GET /health` - health check
///
/// Other methods on these paths get `405 Method Not Allowed`.
pub fn facilitator_router<F>(facilitator: Arc<F>) -> Router
where
    F: Facilitator + 'static,
{
    Router::new()
        .route("/verify", post(post_verify::<F>))
        .route("/settle", post(post_settle::<F>))
        .route("/health", get(get_health))
        .with_state(facilitator)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use pay402::{Payment, PaymentRequirements};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::local::LocalFacilitator;

    #[derive(Debug, thiserror::Error)]
    #[error("chain node unreachable")]
    struct Down;

    struct Broken;

    #[async_trait::async_trait]
    impl Facilitator for Broken {
        type Error = Down;

        async fn verify(&self, _: &VerifyRequest) -> Result<VerifyResponse, Down> {
            Err(Down)
        }

        async fn settle(&self, _: &SettleRequest) -> Result<SettleResponse, Down> {
            Err(Down)
        }
    }

    fn local() -> Router {
        facilitator_router(Arc::new(LocalFacilitator::new(["8453"])))
    }

    async fn call(router: Router, method: Method, uri: &str, body: impl Into<Body>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn payment() -> Payment {
        let requirements = PaymentRequirements::exact("1000", "0xToken", "8453", "0xRecipient");
        Payment::for_requirements(&requirements, "0xabc", "0xSender")
    }

    #[tokio::test]
    async fn verify_returns_facilitator_answer() {
        let body = json!({ "txHash": "0xabc", "chain": "8453" }).to_string();
        let response = call(local(), Method::POST, "/verify", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["valid"], true);
        assert_eq!(json["txHash"], "0xabc");
    }

    #[tokio::test]
    async fn settle_returns_facilitator_answer() {
        let body = serde_json::to_string(&SettleRequest { payment: payment() }).unwrap();
        let response = call(local(), Method::POST, "/settle", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["settled"], true);
        assert!(json["timestamp"].is_u64());
    }

    #[tokio::test]
    async fn undecodable_body_is_bad_request() {
        for uri in ["/verify", "/settle"] {
            let response = call(local(), Method::POST, uri, "{oops").await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], b"Invalid request body");
        }
    }

    #[tokio::test]
    async fn facilitator_error_is_json_500() {
        let router = facilitator_router(Arc::new(Broken));
        let body = json!({ "txHash": "0xabc", "chain": "8453" }).to_string();
        let response = call(router, Method::POST, "/verify", body).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({ "error": "chain node unreachable" }));
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let response = call(local(), Method::GET, "/verify", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let response = call(local(), Method::POST, "/health", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = call(local(), Method::GET, "/health", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
