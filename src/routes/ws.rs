//! Realtime channel endpoint.
//!
//! Protocol: the client opens the socket and sends a `join` frame carrying
//! its user id, which binds the channel in the registry. The server then
//! pushes `receive_notification` frames until the socket closes, at which
//! point the channel unregisters itself.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::realtime::PushEvent;

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ClientFrame {
    Join {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ServerFrame<'a> {
    ReceiveNotification { data: &'a PushEvent },
}

/// `GET /ws`
pub async fn ws_handler(
    State(state): State<Arc<crate::state::State>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: Arc<crate::state::State>, mut socket: WebSocket) {
    // The channel is anonymous until the client joins.
    let user_id = loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<ClientFrame>(text.as_str()) {
                    Ok(ClientFrame::Join { user_id }) => break user_id,
                    Err(_) => debug!("ignoring unrecognized frame before join"),
                }
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => {}
        }
    };

    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(&user_id, conn_id, tx);
    info!(user_id = %user_id, conn_id = %conn_id, "realtime channel joined");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            event = rx.recv() => {
                // None means a newer connection replaced this one.
                let Some(event) = event else { break };
                let frame = ServerFrame::ReceiveNotification { data: &event };
                let Ok(json) = serde_json::to_string(&frame) else { continue };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames after the join are not part of the
                    // protocol and are dropped.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.registry.unregister(conn_id);
    info!(user_id = %user_id, conn_id = %conn_id, "realtime channel closed");
}
