//! HTTP transport for the MCP server
//!
//! Exposes the JSON-RPC surface at `POST /rpc` alongside a health probe.
//! The handler reads the raw body so malformed JSON is answered with a
//! JSON-RPC parse error instead of a bare 400 from the extractor.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{RecallError, Result};

use super::router::McpRouter;

/// Upper bound on a single request, engine round trips included.
const REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request router shared with the stdio transport.
    pub router: Arc<McpRouter>,
    /// When the server started, for the health probe.
    pub started_at: DateTime<Utc>,
}

/// HTTP server wrapping the MCP router.
pub struct RpcServer {
    config: ServerConfig,
    router: Arc<McpRouter>,
}

impl RpcServer {
    pub fn new(config: ServerConfig, router: Arc<McpRouter>) -> Self {
        Self { config, router }
    }

    /// Runs the server until a shutdown signal arrives.
    pub async fn serve(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| RecallError::Config(format!("Invalid listen address {addr}: {e}")))?;

        let state = Arc::new(AppState {
            router: Arc::clone(&self.router),
            started_at: Utc::now(),
        });
        let app = create_router(state);

        info!("Starting MCP server on {}", addr);
        info!("JSON-RPC endpoint at POST /rpc, health probe at GET /health");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RecallError::Transport(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| RecallError::Transport(format!("Server error: {e}")))?;

        info!("Server shut down gracefully");
        Ok(())
    }
}

/// Builds the axum router with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(REQUEST_DEADLINE))
        .layer(TraceLayer::new_for_http())
}

async fn rpc_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match state.router.handle_line(&body).await {
        Some(response) => Json(response).into_response(),
        // Notifications are accepted without a body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": uptime.num_seconds(),
    }))
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
