//! Webhook HTTP server.
//!
//! Routes:
//!
//! * `POST /webhook`: verify, parse and sync a change set. With
//!   `?initialIndex=true` the body is ignored and a full reindex with
//!   replace-all runs instead.
//! * `GET /health`: liveness.

pub mod signature;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use search_sync_pipeline::{PipelineError, SyncOptions, SyncOrchestrator, SyncOutcome};

pub use signature::{SignatureError, SignatureVerifier, SIGNATURE_HEADER};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    /// `None` disables signature verification.
    pub verifier: Option<Arc<SignatureVerifier>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, secret: Option<&str>) -> Self {
        if secret.is_none() {
            warn!("WEBHOOK_SECRET is not set, webhook signatures will not be verified");
        }
        Self {
            orchestrator,
            verifier: secret.map(|s| Arc::new(SignatureVerifier::new(s))),
        }
    }
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookQuery {
    #[serde(default)]
    pub initial_index: bool,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(verifier) = &state.verifier {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if let Err(e) = verifier.verify(signature, &body) {
            warn!(error = %e, "Rejected webhook");
            return error_response(StatusCode::UNAUTHORIZED, json!({ "error": e.to_string() }));
        }
    }

    let result = if query.initial_index {
        info!("Initial index requested");
        state
            .orchestrator
            .reindex(&SyncOptions::default().with_replace_all(true))
            .await
    } else {
        if !is_json(&headers) {
            return error_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": "content type must be application/json" }),
            );
        }
        state
            .orchestrator
            .sync_payload(&body, &SyncOptions::default())
            .await
    };

    match result {
        Ok(outcome) => (StatusCode::OK, Json(success_body(&outcome))).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn success_body(outcome: &SyncOutcome) -> Value {
    json!({
        "status": "ok",
        "saved": outcome.saved_count(),
        "deleted": outcome.deleted_count(),
        "indices": outcome.indices,
    })
}

fn pipeline_error_response(e: PipelineError) -> Response {
    let status = match &e {
        PipelineError::InvalidPayload(_) | PipelineError::InvalidOptions(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %e, phase = %e.phase(), "Sync failed");
    } else {
        warn!(error = %e, "Rejected webhook payload");
    }

    error_response(
        status,
        json!({ "error": e.to_string(), "phase": e.phase() }),
    )
}

fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("application/json; charset=utf-8")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[test]
    fn test_error_status_mapping() {
        let response = pipeline_error_response(PipelineError::invalid_options("bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = pipeline_error_response(PipelineError::serialize("a", "boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
