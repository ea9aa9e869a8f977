//! Typed CRUD access to User, Post, and Notification documents.
//!
//! The trait is the only surface the domain components see. Toggle-style
//! mutations (likes, friend pairs) are exposed as atomic primitives rather
//! than read-then-write sequences, so interleaved requests cannot tear them.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Comment, Notification, Post, User};

mod memory;
mod redis_store;
mod scripts;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to decode stored document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("email {email} already registered")]
    DuplicateEmail { email: String },
}

/// Outcome of an atomic friend-pair toggle.
#[derive(Debug, Clone)]
pub struct FriendToggle {
    /// True when the pair was befriended, false when unfriended.
    pub added: bool,
    /// The first user's friend ids after the toggle committed.
    pub friend_ids: Vec<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a user, reserving its email. `DuplicateEmail` on conflict.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Applies a profile edit, returning the updated user if it exists.
    async fn update_profile(
        &self,
        id: &str,
        description: Option<&str>,
        picture_path: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    /// Atomically flips the symmetric relation between `a` and `b`. Both
    /// sides commit together; a half-written pair is unobservable.
    async fn toggle_friend_pair(&self, a: &str, b: &str) -> Result<FriendToggle, StoreError>;
    async fn friend_ids(&self, id: &str) -> Result<Vec<String>, StoreError>;

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError>;
    async fn post(&self, id: &str) -> Result<Option<Post>, StoreError>;
    /// Every post, newest first.
    async fn all_posts(&self) -> Result<Vec<Post>, StoreError>;
    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, StoreError>;
    /// Atomically toggles `user_id` in the like set. `None` when the post is
    /// gone; otherwise the updated post and whether the toggle landed on
    /// "liked".
    async fn toggle_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<(Post, bool)>, StoreError>;
    /// Atomically appends to the comment log, preserving insertion order.
    async fn append_comment(
        &self,
        post_id: &str,
        comment: &Comment,
    ) -> Result<Option<Post>, StoreError>;
    /// Hard delete. Returns whether the post existed.
    async fn delete_post(&self, id: &str) -> Result<bool, StoreError>;

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;
    /// Newest first.
    async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, StoreError>;
}
