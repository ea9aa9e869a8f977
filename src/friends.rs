//! Friend graph manager. The relation is symmetric and toggle-based: one
//! call befriends two strangers, the next call unfriends them. Both sides
//! commit in a single store primitive, so symmetry holds after every call.

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{FriendSummary, NotificationKind},
    notify::Notifier,
    store::DocumentStore,
};

#[derive(Clone)]
pub struct FriendGraph {
    store: Arc<dyn DocumentStore>,
    notifier: Notifier,
}

impl FriendGraph {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Toggles the relation between `user_id` and `friend_id`, returning
    /// `user_id`'s updated, formatted friend list. Befriending notifies the
    /// other side; unfriending is silent.
    pub async fn toggle_friendship(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> Result<Vec<FriendSummary>, AppError> {
        if user_id == friend_id {
            return Err(AppError::InvalidOperation(
                "cannot friend yourself".to_string(),
            ));
        }
        if self.store.user(user_id).await?.is_none() {
            return Err(AppError::NotFound("user"));
        }
        if self.store.user(friend_id).await?.is_none() {
            return Err(AppError::NotFound("user"));
        }

        let toggle = self.store.toggle_friend_pair(user_id, friend_id).await?;
        if toggle.added {
            self.notifier
                .notify(
                    friend_id,
                    NotificationKind::Friend,
                    format!("User {user_id} added you as a friend"),
                    user_id.to_string(),
                )
                .await?;
        }

        self.summaries(&toggle.friend_ids).await
    }

    pub async fn friends_of(&self, user_id: &str) -> Result<Vec<FriendSummary>, AppError> {
        if self.store.user(user_id).await?.is_none() {
            return Err(AppError::NotFound("user"));
        }
        let ids = self.store.friend_ids(user_id).await?;
        self.summaries(&ids).await
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<FriendSummary>, AppError> {
        let mut friends = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.store.user(id).await? {
                friends.push(FriendSummary::from(&user));
            }
        }
        Ok(friends)
    }
}
