//! Notification service: persist a durable record, then attempt best-effort
//! realtime delivery. Delivery problems never roll back the stored record.

use std::sync::Arc;

use tracing::debug;

use crate::{
    error::AppError,
    models::{Notification, NotificationKind},
    realtime::{PushEvent, RealtimeRegistry},
    store::DocumentStore,
};

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn DocumentStore>,
    registry: RealtimeRegistry,
}

impl Notifier {
    pub fn new(store: Arc<dyn DocumentStore>, registry: RealtimeRegistry) -> Self {
        Self { store, registry }
    }

    /// Stores the notification, then pushes it if the recipient has an
    /// active channel. An offline recipient simply reads it from the log
    /// later; a failed send is logged inside the registry and swallowed.
    pub async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        message: String,
        related_id: String,
    ) -> Result<(), AppError> {
        let notification = Notification::new(recipient, kind, message.clone(), related_id.clone());
        self.store.insert_notification(&notification).await?;

        let delivered = self.registry.route_to(
            recipient,
            PushEvent {
                kind,
                message,
                post_id: related_id,
            },
        );
        debug!(recipient = %recipient, ?kind, delivered, "notification stored");

        Ok(())
    }

    /// Newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        Ok(self.store.notifications_for(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use crate::store::MemoryStore;

    use super::*;

    fn notifier() -> Notifier {
        Notifier::new(Arc::new(MemoryStore::new()), RealtimeRegistry::new())
    }

    #[tokio::test]
    async fn stored_even_when_recipient_is_offline() {
        let notifier = notifier();
        notifier
            .notify(
                "alice",
                NotificationKind::Friend,
                "User bob added you as a friend".to_string(),
                "bob".to_string(),
            )
            .await
            .unwrap();

        let stored = notifier.list("alice").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, NotificationKind::Friend);
        assert_eq!(stored[0].related_id, "bob");
    }

    #[tokio::test]
    async fn pushes_to_an_active_channel() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let registry = RealtimeRegistry::new();
        let notifier = Notifier::new(store, registry.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register("alice", Uuid::new_v4(), tx);

        notifier
            .notify(
                "alice",
                NotificationKind::Comment,
                "User bob commented on your post".to_string(),
                "post-9".to_string(),
            )
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, NotificationKind::Comment);
        assert_eq!(event.post_id, "post-9");
        // Durable copy exists regardless of the push.
        assert_eq!(notifier.list("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let notifier = notifier();
        for related in ["first", "second"] {
            notifier
                .notify(
                    "alice",
                    NotificationKind::Like,
                    "User bob liked your post".to_string(),
                    related.to_string(),
                )
                .await
                .unwrap();
        }

        let stored = notifier.list("alice").await.unwrap();
        assert_eq!(stored[0].related_id, "second");
        assert_eq!(stored[1].related_id, "first");
    }
}
