//! Post interaction engine: create, feed, like, comment, share, delete.
//! Interactions that affect another user emit a notification through the
//! notification service; search indexing rides along and never fails the
//! request.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::{
    error::AppError,
    models::{Comment, NotificationKind, Post},
    notify::Notifier,
    search::SearchIndex,
    store::DocumentStore,
};

#[derive(Clone)]
pub struct PostEngine {
    store: Arc<dyn DocumentStore>,
    search: Arc<dyn SearchIndex>,
    notifier: Notifier,
}

impl PostEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        search: Arc<dyn SearchIndex>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            search,
            notifier,
        }
    }

    pub async fn create(
        &self,
        author_id: &str,
        description: String,
        picture_path: Option<String>,
    ) -> Result<Post, AppError> {
        let author = self
            .store
            .user(author_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        let post = Post::new(&author, description, picture_path);
        self.store.insert_post(&post).await?;
        self.index(&post).await;
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn feed(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.store.all_posts().await?)
    }

    pub async fn posts_by(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        Ok(self.store.posts_by_user(user_id).await?)
    }

    /// Toggles the actor's like. A toggle that lands on "liked" notifies the
    /// owner, unless the actor is the owner.
    pub async fn like(&self, post_id: &str, actor_id: &str) -> Result<Post, AppError> {
        let (post, liked) = self
            .store
            .toggle_like(post_id, actor_id)
            .await?
            .ok_or(AppError::NotFound("post"))?;

        if liked && post.user_id != actor_id {
            self.notifier
                .notify(
                    &post.user_id,
                    NotificationKind::Like,
                    format!("User {actor_id} liked your post"),
                    post_id.to_string(),
                )
                .await?;
        }
        Ok(post)
    }

    /// Appends to the comment log; insertion order is never reordered.
    pub async fn comment(
        &self,
        post_id: &str,
        actor_id: &str,
        text: &str,
    ) -> Result<Post, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "comment text must not be empty".to_string(),
            ));
        }

        let comment = Comment {
            user_id: actor_id.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let post = self
            .store
            .append_comment(post_id, &comment)
            .await?
            .ok_or(AppError::NotFound("post"))?;

        if post.user_id != actor_id {
            self.notifier
                .notify(
                    &post.user_id,
                    NotificationKind::Comment,
                    format!("User {actor_id} commented on your post"),
                    post_id.to_string(),
                )
                .await?;
        }
        Ok(post)
    }

    /// Creates a content copy attributed to the actor. The original post is
    /// untouched; no share count is tracked.
    pub async fn share(&self, post_id: &str, actor_id: &str) -> Result<Post, AppError> {
        let original = self
            .store
            .post(post_id)
            .await?
            .ok_or(AppError::NotFound("post"))?;
        let actor = self
            .store
            .user(actor_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        let mut copy = Post::new(
            &actor,
            original.description.clone(),
            original.picture_path.clone(),
        );
        copy.shared = true;
        self.store.insert_post(&copy).await?;
        self.index(&copy).await;

        if original.user_id != actor_id {
            self.notifier
                .notify(
                    &original.user_id,
                    NotificationKind::Share,
                    format!("User {actor_id} shared your post"),
                    post_id.to_string(),
                )
                .await?;
        }
        Ok(copy)
    }

    /// Hard delete, owner only.
    pub async fn delete(&self, post_id: &str, requester_id: &str) -> Result<(), AppError> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or(AppError::NotFound("post"))?;
        if post.user_id != requester_id {
            return Err(AppError::Unauthorized);
        }

        self.store.delete_post(post_id).await?;
        if let Err(err) = self.search.remove_post(post_id).await {
            warn!(post_id = %post_id, error = %err, "failed to remove post from search index");
        }
        Ok(())
    }

    async fn index(&self, post: &Post) {
        if let Err(err) = self.search.index_post(post).await {
            warn!(post_id = %post.id, error = %err, "failed to index post");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{
        models::User, realtime::RealtimeRegistry, search::MemoryIndex, store::MemoryStore,
    };

    use super::*;

    async fn engine_with(users: &[&str]) -> PostEngine {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        for id in users {
            store
                .insert_user(&User {
                    id: id.to_string(),
                    first_name: id.to_string(),
                    last_name: "Tester".to_string(),
                    email: format!("{id}@example.com"),
                    password_hash: "hash".to_string(),
                    picture_path: String::new(),
                    description: String::new(),
                    location: "Testville".to_string(),
                    occupation: String::new(),
                    friends: Vec::new(),
                    viewed_profile: 0,
                    impressions: 0,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let notifier = Notifier::new(store.clone(), RealtimeRegistry::new());
        PostEngine::new(store, Arc::new(MemoryIndex::new()), notifier)
    }

    #[tokio::test]
    async fn like_toggles_and_notifies_only_on_the_liking_transition() {
        let engine = engine_with(&["alice", "bob"]).await;
        let post = engine.create("alice", "hello".to_string(), None).await.unwrap();

        let liked = engine.like(&post.id, "bob").await.unwrap();
        assert_eq!(liked.likes.get("bob"), Some(&true));
        assert_eq!(engine.notifier.list("alice").await.unwrap().len(), 1);

        let unliked = engine.like(&post.id, "bob").await.unwrap();
        assert!(!unliked.likes.contains_key("bob"));
        // No second notification for the unlike.
        assert_eq!(engine.notifier.list("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn owners_do_not_get_notified_about_their_own_likes() {
        let engine = engine_with(&["alice"]).await;
        let post = engine.create("alice", "hello".to_string(), None).await.unwrap();

        engine.like(&post.id, "alice").await.unwrap();
        assert!(engine.notifier.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_keep_insertion_order() {
        let engine = engine_with(&["alice", "bob"]).await;
        let post = engine.create("alice", "hello".to_string(), None).await.unwrap();

        for text in ["first", "second", "third"] {
            engine.comment(&post.id, "bob", text).await.unwrap();
        }

        let updated = engine.posts_by("alice").await.unwrap().remove(0);
        let texts: Vec<&str> = updated.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert_eq!(engine.notifier.list("alice").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_comments_are_rejected() {
        let engine = engine_with(&["alice"]).await;
        let post = engine.create("alice", "hello".to_string(), None).await.unwrap();

        assert!(matches!(
            engine.comment(&post.id, "alice", "   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn share_copies_content_and_notifies_the_original_owner() {
        let engine = engine_with(&["alice", "bob"]).await;
        let post = engine
            .create("alice", "hello".to_string(), Some("pic.jpg".to_string()))
            .await
            .unwrap();

        let copy = engine.share(&post.id, "bob").await.unwrap();
        assert!(copy.shared);
        assert_eq!(copy.user_id, "bob");
        assert_eq!(copy.description, "hello");
        assert_eq!(copy.picture_path.as_deref(), Some("pic.jpg"));

        // Original untouched, owner notified once.
        let original = engine.posts_by("alice").await.unwrap().remove(0);
        assert!(!original.shared);
        let stored = engine.notifier.list("alice").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, NotificationKind::Share);
    }

    #[tokio::test]
    async fn only_the_owner_may_delete() {
        let engine = engine_with(&["alice", "bob"]).await;
        let post = engine.create("alice", "hello".to_string(), None).await.unwrap();

        assert!(matches!(
            engine.delete(&post.id, "bob").await,
            Err(AppError::Unauthorized)
        ));
        engine.delete(&post.id, "alice").await.unwrap();
        assert!(engine.feed().await.unwrap().is_empty());

        assert!(matches!(
            engine.delete(&post.id, "alice").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_posts_are_not_found() {
        let engine = engine_with(&["alice"]).await;
        assert!(matches!(
            engine.like("ghost", "alice").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            engine.comment("ghost", "alice", "hi").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            engine.share("ghost", "alice").await,
            Err(AppError::NotFound(_))
        ));
    }
}
