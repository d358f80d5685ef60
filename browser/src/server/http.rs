//! HTTP server for the browser.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use super::config::ServerConfig;
use super::handlers::{
    AppState, handle_connect, handle_disconnect, handle_healthy, handle_metrics,
    handle_namespaces, handle_ready, handle_records, handle_schema_summary, handle_sets,
    handle_stats,
};
use super::metrics::Metrics;
use super::middleware::{trace_request, track_metrics};
use crate::browser::Browser;

/// Builds the router with every route and middleware layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/connect", post(handle_connect))
        .route("/api/disconnect", post(handle_disconnect))
        .route("/api/stats", get(handle_stats))
        .route("/api/namespaces", get(handle_namespaces))
        .route("/api/namespaces/{namespace}/sets", get(handle_sets))
        .route(
            "/api/namespaces/{namespace}/sets/{set}/records",
            get(handle_records),
        )
        .route("/api/schema-summary", post(handle_schema_summary))
        .route("/metrics", get(handle_metrics))
        .route("/-/healthy", get(handle_healthy))
        .route("/-/ready", get(handle_ready))
        .layer(middleware::from_fn(trace_request))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(cors)
        .with_state(state)
}

/// HTTP server for the browser service.
pub struct BrowserServer {
    browser: Arc<Browser>,
    config: ServerConfig,
}

impl BrowserServer {
    pub fn new(browser: Arc<Browser>, config: ServerConfig) -> Self {
        Self { browser, config }
    }

    /// Run the HTTP server until SIGINT or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        let state = AppState {
            browser: self.browser.clone(),
            metrics: Arc::new(Metrics::new()),
        };
        let app = router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        tracing::info!("Starting browser HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if self.browser.disconnect().await {
            tracing::info!("Closed cluster session on shutdown");
        }
        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
