mod recent;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{PipelineEvent, PipelineStats, Result};

pub use recent::RecentEvents;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub market: String,
    /// Live pipeline events, fanned out to every WebSocket client.
    pub events_tx: broadcast::Sender<PipelineEvent>,
    /// Last few events, replayed to clients when they connect.
    pub recent: RecentEvents,
    pub stats: Arc<RwLock<PipelineStats>>,
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .merge(routes::static_router())
        .with_state(state)
        .layer(cors)
}

/// Bind and run the dashboard server until it fails.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}
