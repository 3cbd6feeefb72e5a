//! HTTP API server for the coaching relay

pub mod error;
pub mod health;
pub mod rate_limit;
pub mod speak;
pub mod web;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, get_service};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::relay::CoachRelay;
use crate::Result;

pub use error::ApiError;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub relay: CoachRelay,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    relay: CoachRelay,
    port: u16,
    static_dir: Option<PathBuf>,
    rate_limit_per_minute: Option<u32>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(relay: CoachRelay, port: u16) -> Self {
        Self {
            relay,
            port,
            static_dir: None,
            rate_limit_per_minute: None,
        }
    }

    /// Set the static files directory for serving the web client
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Cap requests per minute across all clients
    #[must_use]
    pub const fn rate_limit_per_minute(mut self, rpm: Option<u32>) -> Self {
        self.rate_limit_per_minute = rpm;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let rate_limiter = self.rate_limit_per_minute.map(rate_limit::create_limiter);

        let state = Arc::new(ApiState {
            relay: self.relay,
            rate_limiter,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(speak::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // Single-page client: every unmatched route gets index.html
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).fallback(ServeFile::new(&index_file));

            router = router.fallback_service(
                get_service(serve_dir).fallback(error::method_not_allowed),
            );
            tracing::info!(path = %static_dir.display(), "serving static files");
        } else {
            router =
                router.fallback_service(get(web::index).fallback(error::method_not_allowed));
            tracing::debug!("serving embedded web client");
        }

        // Rate limiting (no-op unless configured)
        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        // CORS layer for cross-origin requests from a separately hosted client
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    ///
    /// # Errors
    ///
    /// Returns error if the server stops with an IO failure
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            rate_limited = self.state.rate_limiter.is_some(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Resolve on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
