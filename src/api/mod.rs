//! HTTP API server for the voice companion

pub mod health;
pub mod reply;
pub mod voice;

use std::sync::Arc;

use axum::Router;
use axum::http::Request;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::reply::ReplyService;
use crate::voice::Conversation;

/// Shared state for API handlers
pub struct ApiState {
    /// Text reply pipeline
    pub replies: ReplyService,

    /// Spoken conversation, when STT and TTS are configured
    pub conversation: Option<Conversation>,
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    #[must_use]
    pub fn new(replies: ReplyService, conversation: Option<Conversation>, port: u16) -> Self {
        Self {
            state: Arc::new(ApiState {
                replies,
                conversation,
            }),
            port,
        }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
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

        tracing::info!(
            port = self.port,
            voice = self.state.conversation.is_some(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Build the full router around `state`
pub fn build_router(state: Arc<ApiState>) -> Router {
    // CORS layer for the browser recorder/player
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "request",
            id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    Router::new()
        .nest(
            "/api",
            reply::router(state.clone()).merge(voice::router(state)),
        )
        .merge(health::router())
        .layer(cors)
        .layer(trace)
}
