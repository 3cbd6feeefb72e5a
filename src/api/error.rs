//! Error responses shared by every API route

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API error, rendered as `{"error": {"code", "message"}}`
///
/// Upstream failures carry no detail; the relay logs the cause.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    MethodNotAllowed,
    RateLimited,
    Upstream,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "Method not allowed".to_string(),
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "too many requests, try again in a minute".to_string(),
            ),
            Self::Upstream => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "something went wrong generating a reply".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}

/// Method fallback for routes that only accept some verbs
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn rate_limited_has_code_and_message() {
        let (status, json) = render(ApiError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"]["code"], "rate_limited");
        assert!(json["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn upstream_message_is_generic() {
        let (status, json) = render(ApiError::Upstream).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "internal_error");
    }
}
