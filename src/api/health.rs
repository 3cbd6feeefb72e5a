//! Health check endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use super::error::method_not_allowed;
use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub llm: CheckResult,
    pub tts: CheckResult,
}

/// Result of a single health check
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok",
            message: Some(message.into()),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: "unavailable",
            message: Some("not configured, replies are text-only".to_string()),
        }
    }
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - which upstream providers are wired up?
///
/// Missing synthesis only degrades replies to text, so it never fails readiness.
async fn ready(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let llm = CheckResult::ok(state.relay.model_id());
    let tts = state
        .relay
        .synthesizer_name()
        .map_or_else(CheckResult::unavailable, CheckResult::ok);

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ok",
            checks: ReadinessChecks { llm, tts },
        }),
    )
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health).fallback(method_not_allowed))
}

/// Relay status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub persona_id: String,
    pub persona_name: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<&'static str>,
    pub max_output_tokens: u32,
}

/// Get relay status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    let persona = state.relay.persona();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        persona_id: persona.id.clone(),
        persona_name: persona.name.clone(),
        model: state.relay.model_id().to_string(),
        tts_provider: state.relay.synthesizer_name(),
        max_output_tokens: persona.max_output_tokens,
    })
}

/// Build readiness router (needs state for checks)
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/ready", get(ready).fallback(method_not_allowed))
        .route("/api/status", get(status).fallback(method_not_allowed))
        .with_state(state)
}
