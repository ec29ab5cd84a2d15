//! Mutating Admission Webhook for Pod trace context
//!
//! The API server calls this webhook on every Pod create. Pods without a span
//! context under [`TRACE_ANNOTATION_KEY`](crate::TRACE_ANNOTATION_KEY) get a
//! freshly minted one through a JSON Patch; Pods that already carry one pass
//! through untouched. The webhook never rejects a Pod on policy grounds.

pub mod pod;
pub mod review;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::trace::SpanContextMinter;
use crate::MUTATE_PATH;

/// Shared state for webhook handlers
///
/// Written once at startup and only read afterwards, so requests share it
/// without locking.
#[derive(Debug)]
pub struct WebhookState {
    /// Mints span contexts under the configured sampling policy
    pub minter: SpanContextMinter,
}

impl WebhookState {
    /// Create a new webhook state around the given minter
    pub fn new(minter: SpanContextMinter) -> Self {
        Self { minter }
    }
}

/// Create the webhook router
///
/// - `POST /mutate` - Pod admission reviews
/// - `GET /healthz` - liveness probe
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(MUTATE_PATH, post(pod::mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleRate;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let state = Arc::new(WebhookState::new(SpanContextMinter::new(
            SampleRate::ALWAYS,
        )));
        webhook_router(state)
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn mutate_rejects_get() {
        let request = Request::builder()
            .method("GET")
            .uri(MUTATE_PATH)
            .body(Body::empty())
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
