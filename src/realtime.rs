//! Realtime registry: maps online user ids to their push channel and routes
//! outbound events. Owned by the server state, never a process global.
//!
//! State machine per user id is Disconnected -> Connected -> Disconnected.
//! A connect while already Connected replaces the entry (last writer wins);
//! the replaced sender is dropped, which ends the orphaned socket task from
//! its own side.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::NotificationKind;

/// Payload pushed over a live channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub post_id: String,
}

struct Channel {
    conn_id: Uuid,
    tx: UnboundedSender<PushEvent>,
}

#[derive(Clone, Default)]
pub struct RealtimeRegistry {
    channels: Arc<DashMap<String, Channel>>,
}

impl RealtimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `user_id` to a channel. Idempotent; last writer wins.
    pub fn register(&self, user_id: &str, conn_id: Uuid, tx: UnboundedSender<PushEvent>) {
        debug!(user_id = %user_id, conn_id = %conn_id, "channel registered");
        self.channels
            .insert(user_id.to_string(), Channel { conn_id, tx });
    }

    /// Removes whichever entry holds `conn_id`, if any. A connection that was
    /// already replaced by a newer one leaves the registry untouched.
    pub fn unregister(&self, conn_id: Uuid) {
        self.channels.retain(|user_id, channel| {
            let keep = channel.conn_id != conn_id;
            if !keep {
                debug!(user_id = %user_id, conn_id = %conn_id, "channel unregistered");
            }
            keep
        });
    }

    /// True iff an entry existed and the send did not fail.
    pub fn route_to(&self, user_id: &str, event: PushEvent) -> bool {
        let Some(channel) = self.channels.get(user_id) else {
            debug!(user_id = %user_id, "no active channel, skipping push");
            return false;
        };
        match channel.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "push channel send failed");
                false
            }
        }
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.channels.contains_key(user_id)
    }
}
