use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::puller::{LinePuller, PullerStatus};

/// Serves the readiness probe on an already-bound listener until `shutdown`
/// fires.
pub async fn serve(
    listener: TcpListener,
    puller: Arc<LinePuller>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/ready", get(ready_handler))
        .with_state(puller);

    info!(addr = %listener.local_addr()?, "readiness server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("readiness server shut down");
    Ok(())
}

async fn ready_handler(State(puller): State<Arc<LinePuller>>) -> impl IntoResponse {
    let status = puller.status().await;
    debug!(?status, "readiness probed");

    match status {
        PullerStatus::Ready => (StatusCode::OK, Json(json!({"response": "OK"}))),
        PullerStatus::NotReady => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"response": "Please try later"})),
        ),
        PullerStatus::ProviderUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"response": "Service is unavailable"})),
        ),
    }
}
