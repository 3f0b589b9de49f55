//! Todoist Gateway
//!
//! Single-binary service that:
//! 1. Bridges an external OAuth client's login to Todoist (`/authorize`, `/callback`)
//! 2. Issues an in-memory session per completed login
//! 3. Exposes the Todoist tool catalogue to agents holding a session, as an
//!    MCP server (`/mcp`) and as plain JSON (`/tools`, `/tools/call`)

mod config;
mod error;
mod mcp;
mod metrics;
mod oauth;
mod session;
mod tools;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use todoist_auth::CredentialBridge;
use todoist_tools::{Dispatcher, HttpClientFactory, ToolRegistry};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::session::{SessionIssuer, SessionLimits, SessionStore};

/// How long in-flight requests may take to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    bridge: CredentialBridge,
    issuer: SessionIssuer,
    sessions: SessionStore,
    dispatcher: Dispatcher,
    prometheus: PrometheusHandle,
    started_at: Instant,
}

impl AppState {
    fn new(
        http: reqwest::Client,
        bridge_config: todoist_auth::BridgeConfig,
        limits: SessionLimits,
        prometheus: PrometheusHandle,
    ) -> Result<Self> {
        let registry = ToolRegistry::with_default_tools().context("building tool registry")?;
        let clients = HttpClientFactory::new(http.clone(), bridge_config.api_base_url.clone());
        let sessions = SessionStore::with_limits(limits);

        Ok(Self {
            bridge: CredentialBridge::new(http, bridge_config),
            issuer: SessionIssuer::new(sessions.clone()),
            sessions,
            dispatcher: Dispatcher::new(registry, Arc::new(clients)),
            prometheus,
            started_at: Instant::now(),
        })
    }
}

/// Build the axum router with all routes and shared state.
///
/// `max_connections` caps concurrently handled requests.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/authorize", get(oauth::authorize))
        .route("/callback", get(oauth::callback))
        .route("/tools", get(tools::list_tools))
        .route("/tools/call", post(tools::call_tool))
        .route("/mcp", post(mcp::handle_post))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs; LOG_LEVEL wins over RUST_LOG
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting todoist-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        public_url = %config.server.public_url,
        api_base_url = %config.todoist.api_base_url,
        scope = %config.todoist.scope,
        "configuration loaded"
    );

    let bridge_config = config.bridge_config()?;
    let limits = config.session_limits();
    let app_state = AppState::new(
        reqwest::Client::new(),
        bridge_config,
        limits,
        prometheus_handle,
    )?;
    info!(
        tools = app_state.dispatcher.registry().len(),
        redirect_uri = %app_state.bridge.config().redirect_uri(),
        allowed_redirects = app_state.bridge.config().allowed_redirect_uris.len(),
        session_ttl_secs = limits.ttl.as_secs(),
        max_sessions = limits.max_sessions,
        "gateway ready"
    );

    let sweeper = tokio::spawn(session::sweep_expired(app_state.sessions.clone()));

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timer starts when the signal fires, not when the server starts
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    sweeper.abort();
    info!("shutdown complete");
    Ok(())
}

/// Health endpoint: status, uptime and live session count.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "sessions": state.sessions.len().await,
        "tools": state.dispatcher.registry().len(),
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
