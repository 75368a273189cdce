//! HTTP server.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::health;
use crate::webhook::{self, WebhookState};

/// Webhook (GET probe + POST deliveries) at `webhook_path`, plus `/api/health`.
pub fn build_router(state: WebhookState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, get(webhook::webhook_get).post(webhook::webhook_post))
        .route("/api/health", get(health::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve_until(listener, app, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then let
/// in-flight requests finish.
pub async fn serve_until(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!("Meterline listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
