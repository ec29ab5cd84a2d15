//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pods, embedding a span context in the
//! Pod's annotations unless one is already present.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::patch::build_annotation_patch;
use crate::trace::SpanContextMinter;
use crate::TRACE_ANNOTATION_KEY;

use super::review::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use super::WebhookState;

/// Error type for webhook transport failures
///
/// These never become an AdmissionResponse: the request could not be
/// understood well enough to answer for a specific Pod.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The request body is not a JSON AdmissionReview
    #[error("invalid admission review body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The admission review was well-formed JSON but unusable
    #[error("invalid admission review: {0}")]
    InvalidReview(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::Decode(_) | WebhookError::InvalidReview(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// Handle mutating admission review for Pods
///
/// This handler:
/// 1. Decodes the envelope into an AdmissionReview (400 on failure)
/// 2. Runs the request through [`mutate_pod`], which also decodes the Pod
/// 3. Echoes the review back with the response half filled in
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    body: Bytes,
) -> Result<Json<AdmissionReview>, WebhookError> {
    let review: AdmissionReview = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Failed to decode admission review");
        WebhookError::from(e)
    })?;

    let request = review.into_request().ok_or_else(|| {
        error!("Admission review carries no request");
        WebhookError::InvalidReview("review has no request".to_string())
    })?;

    let response = mutate_pod(&state.minter, &request);
    Ok(Json(response.into_review()))
}

/// Decide whether a Pod needs a span context and build the response
///
/// Allows every Pod that deserializes. The only deny is an object that does
/// not parse as a Pod.
pub fn mutate_pod(minter: &SpanContextMinter, request: &AdmissionRequest) -> AdmissionResponse {
    let uid = request.uid.as_str();

    let Some(obj) = &request.object else {
        debug!(uid = %uid, "No pod object in request, allowing unchanged");
        return request.allow();
    };

    let pod = match parse_pod(obj) {
        Ok(pod) => pod,
        Err(e) => {
            warn!(uid = %uid, error = %e, "Failed to deserialize pod, denying");
            return request
                .allow()
                .deny(format!("could not deserialize pod object: {e}"));
        }
    };
    let pod_name = pod
        .metadata
        .name
        .as_deref()
        .or(pod.metadata.generate_name.as_deref())
        .unwrap_or_default();

    let annotations = pod.metadata.annotations.as_ref();
    let already_tagged = annotations
        .and_then(|a| a.get(TRACE_ANNOTATION_KEY))
        .is_some_and(|v| !v.is_empty());
    if already_tagged {
        debug!(
            uid = %uid,
            pod = %pod_name,
            "Pod already carries a span context, allowing unchanged"
        );
        return request.allow();
    }

    let context = minter.embeddable();
    let patch = build_annotation_patch(annotations, TRACE_ANNOTATION_KEY, &context);

    // An empty value under the key is still an existing value.
    if patch.0.is_empty() {
        debug!(
            uid = %uid,
            pod = %pod_name,
            "Trace annotation present but empty, allowing unchanged"
        );
        return request.allow();
    }

    info!(
        uid = %uid,
        pod = %pod_name,
        namespace = ?request.namespace,
        patch_ops = patch.0.len(),
        "Injecting span context into pod"
    );

    match request.allow().with_patch(&patch) {
        Ok(response) => response,
        Err(e) => {
            error!(uid = %uid, error = %e, "Failed to serialize patch");
            request
                .allow()
                .deny(format!("patch serialization error: {e}"))
        }
    }
}

/// Decode the raw request object as a Pod
fn parse_pod(obj: &Value) -> Result<Pod, serde_json::Error> {
    Pod::deserialize(obj)
}
