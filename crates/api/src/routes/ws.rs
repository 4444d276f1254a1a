use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use std::collections::HashSet;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use common::{EventKey, PipelineEvent};

use crate::{AppState, RecentEvents};

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_events_handler))
}

/// WebSocket endpoint that streams signals and trade results to the dashboard.
async fn ws_events_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before the upgrade so nothing emitted in between is missed
    let events_rx = state.events_tx.subscribe();
    let recent = state.recent.clone();
    ws.on_upgrade(move |socket| handle_ws(socket, events_rx, recent))
}

pub(crate) fn encode(event: &PipelineEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "Failed to encode pipeline event");
            None
        }
    }
}

/// Events already sent from the recent-event snapshot.
///
/// The live receiver is subscribed before the snapshot is read, so an event
/// emitted in between shows up in both.
#[derive(Debug)]
pub(crate) struct SnapshotSent(HashSet<EventKey>);

impl SnapshotSent {
    pub(crate) fn new(snapshot: &[PipelineEvent]) -> Self {
        Self(snapshot.iter().map(PipelineEvent::key).collect())
    }

    /// False for the live copy of a snapshot event, which is then forgotten.
    pub(crate) fn should_send(&mut self, event: &PipelineEvent) -> bool {
        !self.0.remove(&event.key())
    }
}

async fn handle_ws(
    socket: WebSocket,
    mut events_rx: broadcast::Receiver<PipelineEvent>,
    recent: RecentEvents,
) {
    info!("Dashboard client connected");
    let (mut sender, mut receiver) = socket.split();

    // Send recent history first so the client sees previous results
    let snapshot = recent.snapshot().await;
    let mut sent = SnapshotSent::new(&snapshot);
    for event in &snapshot {
        let Some(text) = encode(event) else { continue };
        if sender.send(Message::Text(text)).await.is_err() {
            return;
        }
    }

    // Then stream live events
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Ok(event) => {
                    if !sent.should_send(&event) {
                        continue;
                    }
                    let Some(text) = encode(&event) else { continue };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(dropped = n, "WebSocket client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket client error");
                    break;
                }
                Some(Ok(_)) => {} // dashboard is receive-only
            },
        }
    }

    info!("Dashboard client disconnected");
}
