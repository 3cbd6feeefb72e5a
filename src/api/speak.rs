//! Coaching endpoint: `POST /api/speak` (also served at `/speak`)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use super::error::{method_not_allowed, ApiError};
use super::ApiState;
use crate::conversation::{SpeakRequest, SpeakResponse};

/// Build the speak router
pub fn router(state: Arc<ApiState>) -> Router {
    let speak_route = post(speak).fallback(method_not_allowed);

    Router::new()
        .route("/api/speak", speak_route.clone())
        .route("/speak", speak_route)
        .with_state(state)
}

/// Run one coaching turn
async fn speak(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected speak request body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let response = state
        .relay
        .speak(&request)
        .await
        .map_err(|_| ApiError::Upstream)?;

    Ok(Json(response))
}
