//! Embedded web client, served when no static directory is configured

use axum::http::header;
use axum::response::{Html, IntoResponse};

/// The speech capture page compiled into the binary
pub const INDEX_HTML: &str = include_str!("../../web/index.html");

/// Serve the single-page client
pub async fn index() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-cache")], Html(INDEX_HTML))
}
