use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::session::SubscriptionService;

/// Serves the line subscription stream on an already-bound listener until
/// `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    service: Arc<SubscriptionService>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/v1/lines/subscribe", get(subscribe_handler))
        .with_state(service);

    info!(addr = %listener.local_addr()?, "subscription server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("subscription server shut down");
    Ok(())
}

async fn subscribe_handler(
    ws: WebSocketUpgrade,
    State(service): State<Arc<SubscriptionService>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move { service.handle_socket(socket).await })
}
