//! WebSocket push surface for freshly appended snapshots.
//!
//! `/api/stream` sends the latest snapshot on connect (when one exists), then
//! forwards every snapshot the fetch loop publishes. The core only owns the
//! data and the notification event; connection management stays here at the
//! web-layer boundary.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::models::snapshot::Snapshot;

/// Push hook invoked with each freshly appended snapshot.
#[derive(Clone)]
pub struct SnapshotBroadcaster {
    tx: broadcast::Sender<Snapshot>,
}

impl SnapshotBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Broadcast a snapshot to all subscribers. No subscribers is fine.
    pub fn publish(&self, snapshot: Snapshot) {
        let _ = self.tx.send(snapshot);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// GET /api/stream - WebSocket endpoint for real-time snapshot delivery
pub async fn snapshot_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.broadcaster.subscribe();

    info!("new snapshot stream connection");

    // catch the client up before streaming
    if let Some(latest) = state.history.latest() {
        if send_snapshot(&mut sender, &latest).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    if send_snapshot(&mut sender, &snapshot).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("snapshot stream lagged, dropped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = next_client_message(&mut receiver) => match incoming {
                ClientMessage::Ping(payload) => {
                    let _ = sender.send(Message::Pong(payload)).await;
                }
                ClientMessage::Other => {}
                ClientMessage::Gone => break,
            },
        }
    }

    debug!("snapshot stream disconnected");
}

enum ClientMessage {
    Ping(axum::body::Bytes),
    Other,
    Gone,
}

async fn next_client_message(receiver: &mut SplitStream<WebSocket>) -> ClientMessage {
    match receiver.next().await {
        Some(Ok(Message::Ping(payload))) => ClientMessage::Ping(payload),
        Some(Ok(Message::Close(_))) | None => ClientMessage::Gone,
        Some(Ok(_)) => ClientMessage::Other,
        Some(Err(e)) => {
            debug!("snapshot stream receive error: {}", e);
            ClientMessage::Gone
        }
    }
}

async fn send_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    snapshot: &Snapshot,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    sender.send(Message::Text(payload.into())).await
}
