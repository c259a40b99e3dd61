//! Server execution logic.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{asl_handler, chat_handler, health_check, issue_identity, video_handler},
    predictor::SignPredictor,
    signal::shutdown_signal,
    state::{AppState, PeerRegistry},
};

/// Build the relay router.
///
/// Exposed separately from [`run_server`] so tests can serve it on an
/// ephemeral port.
pub fn router(predictor: Option<Arc<dyn SignPredictor>>) -> Router {
    let state = Arc::new(AppState {
        chat: PeerRegistry::default(),
        video: PeerRegistry::default(),
        predictor,
    });

    Router::new()
        .route("/ws/chat/{peer_id}/", get(chat_handler))
        .route("/ws/video/{peer_id}/", get(video_handler))
        .route("/ws/asl/", get(asl_handler))
        .route("/api/health", get(health_check))
        .route("/api/identity", post(issue_identity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay server.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8000)
/// * `predictor` - The sign prediction model, when one is available
pub async fn run_server(
    host: String,
    port: u16,
    predictor: Option<Arc<dyn SignPredictor>>,
) -> Result<(), Box<dyn std::error::Error>> {
    if predictor.is_none() {
        tracing::warn!("no sign predictor configured; /ws/asl/ will report the model unavailable");
    }
    let app = router(predictor);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("relay server listening on {}", listener.local_addr()?);
    tracing::info!("chat endpoint: ws://{}/ws/chat/{{peer_id}}/", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
