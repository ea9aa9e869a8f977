//! Document types shared by the store, the domain components, and the HTTP
//! boundary. Wire format is camelCase JSON.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 hash. Never leaves the store layer; clients get a [`UserView`].
    pub password_hash: String,
    #[serde(default)]
    pub picture_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub occupation: String,
    /// Symmetric relation: `b` appears here iff this user appears in `b`'s
    /// list. Maintained only through the store's friend-pair toggle.
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub viewed_profile: u64,
    #[serde(default)]
    pub impressions: u64,
    pub created_at: DateTime<Utc>,
}

/// Client-facing user payload, without the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub picture_path: String,
    pub description: String,
    pub location: String,
    pub occupation: String,
    pub friends: Vec<String>,
    pub viewed_profile: u64,
    pub impressions: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            picture_path: user.picture_path.clone(),
            description: user.description.clone(),
            location: user.location.clone(),
            occupation: user.occupation.clone(),
            friends: user.friends.clone(),
            viewed_profile: user.viewed_profile,
            impressions: user.impressions,
            created_at: user.created_at,
        }
    }
}

/// Subset of user fields returned by friend-list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub occupation: String,
    pub location: String,
    pub picture_path: String,
}

impl From<&User> for FriendSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            occupation: user.occupation.clone(),
            location: user.location.clone(),
            picture_path: user.picture_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    /// Owning user.
    pub user_id: String,
    // Author display fields, snapshotted at creation time.
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub user_picture_path: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_path: Option<String>,
    /// Presence of a user id means "liked".
    #[serde(default)]
    pub likes: HashMap<String, bool>,
    /// Append-only, insertion order.
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub shared: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// New post with author display fields snapshotted from `author`.
    pub fn new(author: &User, description: String, picture_path: Option<String>) -> Self {
        Self {
            id: new_id(),
            user_id: author.id.clone(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            location: author.location.clone(),
            user_picture_path: author.picture_path.clone(),
            description,
            picture_path,
            likes: HashMap::new(),
            comments: Vec::new(),
            shared: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Share,
    Friend,
}

/// Durable notification record. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Recipient.
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub related_id: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: &str,
        kind: NotificationKind,
        message: String,
        related_id: String,
    ) -> Self {
        Self {
            id: new_id(),
            user_id: recipient.to_string(),
            kind,
            message,
            related_id,
            created_at: Utc::now(),
        }
    }
}
