//! HTTP surface over the tool registry.
//!
//! - `GET  /health`        liveness check
//! - `GET  /tools`         advertised tool specs
//! - `POST /tools/{name}`  call a tool with a JSON object body

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::tools::{CallError, ToolRegistry};

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "mcp-server";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

pub fn build_app(state: AppState, cfg: &GatewayConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(cfg.max_body_bytes));

    if let Some(secs) = cfg.request_timeout_secs {
        app = app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(secs),
        ));
    }
    app
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn run(cfg: &GatewayConfig, registry: ToolRegistry) -> anyhow::Result<()> {
    let ip: IpAddr = cfg
        .host
        .parse()
        .with_context(|| format!("invalid gateway host: {}", cfg.host))?;
    let addr = SocketAddr::new(ip, cfg.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let tools = registry.len();
    let app = build_app(AppState::new(registry), cfg);
    info!(%addr, tools, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.specs())
}

/// POST /tools/{name}. An empty body is treated as `{}`.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(v) if v.is_object() => v,
            Ok(_) => {
                return error_response(StatusCode::BAD_REQUEST, "arguments must be a JSON object")
            }
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("invalid JSON: {e}"))
            }
        }
    };

    match state.registry.call(&name, args).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e @ CallError::UnknownTool(_)) => {
            error_response(StatusCode::NOT_FOUND, &e.to_string())
        }
        Err(CallError::InvalidArguments(e)) => {
            warn!(tool = %name, "Rejected arguments: {e}");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
