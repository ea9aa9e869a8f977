//! In-memory document store. Selected by `STANDALONE=1` and used throughout
//! the test suite; mirrors the Redis layout (relations held next to the
//! documents, assembled on read).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{Comment, Notification, Post, User};

use super::{DocumentStore, FriendToggle, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    emails: HashMap<String, String>,
    friends: HashMap<String, HashSet<String>>,
    /// Insertion order; the feed reads it newest-first.
    posts: Vec<Post>,
    notifications: HashMap<String, Vec<Notification>>,
}

impl Inner {
    fn sorted_friends(&self, id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .friends
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn assembled_user(&self, id: &str) -> Option<User> {
        let mut user = self.users.get(id)?.clone();
        user.friends = self.sorted_friends(id);
        Some(user)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let email = user.email.to_lowercase();
        if inner.emails.contains_key(&email) {
            return Err(StoreError::DuplicateEmail {
                email: user.email.clone(),
            });
        }
        inner.emails.insert(email, user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.assembled_user(id))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(id) = inner.emails.get(&email.to_lowercase()) else {
            return Ok(None);
        };
        Ok(inner.assembled_user(id))
    }

    async fn update_profile(
        &self,
        id: &str,
        description: Option<&str>,
        picture_path: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(user) = inner.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(description) = description {
            user.description = description.to_string();
        }
        if let Some(picture_path) = picture_path {
            user.picture_path = picture_path.to_string();
        }
        Ok(inner.assembled_user(id))
    }

    async fn toggle_friend_pair(&self, a: &str, b: &str) -> Result<FriendToggle, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let already = inner
            .friends
            .get(a)
            .is_some_and(|set| set.contains(b));
        if already {
            inner.friends.get_mut(a).unwrap().remove(b);
            if let Some(set) = inner.friends.get_mut(b) {
                set.remove(a);
            }
        } else {
            inner
                .friends
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string());
            inner
                .friends
                .entry(b.to_string())
                .or_default()
                .insert(a.to_string());
        }
        Ok(FriendToggle {
            added: !already,
            friend_ids: inner.sorted_friends(a),
        })
    }

    async fn friend_ids(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sorted_friends(id))
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.posts.push(post.clone());
        Ok(())
    }

    async fn post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn all_posts(&self) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.iter().rev().cloned().collect())
    }

    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .rev()
            .filter(|post| post.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn toggle_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<(Post, bool)>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(post) = inner.posts.iter_mut().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        let liked = if post.likes.remove(user_id).is_some() {
            false
        } else {
            post.likes.insert(user_id.to_string(), true);
            true
        };
        Ok(Some((post.clone(), liked)))
    }

    async fn append_comment(
        &self,
        post_id: &str,
        comment: &Comment,
    ) -> Result<Option<Post>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(post) = inner.posts.iter_mut().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        post.comments.push(comment.clone());
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|post| post.id != id);
        Ok(inner.posts.len() < before)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .notifications
            .entry(notification.user_id.clone())
            .or_default()
            .push(notification.clone());
        Ok(())
    }

    async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .notifications
            .get(user_id)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            picture_path: String::new(),
            description: String::new(),
            location: String::new(),
            occupation: String::new(),
            friends: Vec::new(),
            viewed_profile: 0,
            impressions: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_user(&user("a", "a@example.com")).await.unwrap();

        let err = store
            .insert_user(&user("b", "A@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn friend_pair_toggles_both_sides_together() {
        let store = MemoryStore::new();

        let toggle = store.toggle_friend_pair("a", "b").await.unwrap();
        assert!(toggle.added);
        assert_eq!(toggle.friend_ids, vec!["b".to_string()]);
        assert_eq!(store.friend_ids("b").await.unwrap(), vec!["a".to_string()]);

        let toggle = store.toggle_friend_pair("a", "b").await.unwrap();
        assert!(!toggle.added);
        assert!(toggle.friend_ids.is_empty());
        assert!(store.friend_ids("b").await.unwrap().is_empty());
    }
}
