//! Redis-backed document store.
//!
//! Documents are JSON strings under prefixed keys. Friend and like relations
//! live in sets and comment logs in lists, next to the owning document, so
//! each toggle or append is one atomic server-side operation. The relation
//! copies embedded in a document are overwritten from those structures on
//! every read; the set/list is the source of truth.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, cmd};

use crate::models::{Comment, Notification, Post, User};

use super::{
    DocumentStore, FriendToggle, StoreError,
    scripts::{
        APPEND_COMMENT_SCRIPT, REGISTER_USER_SCRIPT, TOGGLE_FRIENDS_SCRIPT, TOGGLE_LIKE_SCRIPT,
    },
};

const KEY_PREFIX: &str = "social";
const SCAN_COUNT: usize = 512;

fn user_key(id: &str) -> String {
    format!("{KEY_PREFIX}:users:{id}")
}

fn friends_key(id: &str) -> String {
    format!("{KEY_PREFIX}:users:{id}:friends")
}

fn email_key(email: &str) -> String {
    format!("{KEY_PREFIX}:emails:{}", email.to_lowercase())
}

fn post_key(id: &str) -> String {
    format!("{KEY_PREFIX}:posts:{id}")
}

fn likes_key(id: &str) -> String {
    format!("{KEY_PREFIX}:posts:{id}:likes")
}

fn comments_key(id: &str) -> String {
    format!("{KEY_PREFIX}:posts:{id}:comments")
}

fn notifications_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}:notifications:{user_id}")
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = cmd("GET").arg(key).query_async(&mut conn).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn assemble_user(&self, mut user: User) -> Result<User, StoreError> {
        user.friends = self.friend_ids(&user.id).await?;
        Ok(user)
    }

    async fn assemble_post(&self, mut post: Post) -> Result<Post, StoreError> {
        let mut conn = self.conn.clone();
        let liked_by: Vec<String> = cmd("SMEMBERS")
            .arg(likes_key(&post.id))
            .query_async(&mut conn)
            .await?;
        post.likes = liked_by.into_iter().map(|id| (id, true)).collect();

        let raw_comments: Vec<String> = cmd("LRANGE")
            .arg(comments_key(&post.id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        post.comments = raw_comments
            .iter()
            .map(|json| serde_json::from_str(json))
            .collect::<Result<_, _>>()?;

        Ok(post)
    }

    /// All post ids, via SCAN. Relation keys share the prefix and are
    /// filtered out by their suffix segment.
    async fn post_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{KEY_PREFIX}:posts:*");
        let doc_prefix = format!("{KEY_PREFIX}:posts:");

        let mut ids = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            for key in batch {
                let rest = &key[doc_prefix.len()..];
                if !rest.contains(':') {
                    ids.push(rest.to_string());
                }
            }
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(user)?;
        let created: i64 = REGISTER_USER_SCRIPT
            .key(email_key(&user.email))
            .key(user_key(&user.id))
            .arg(&user.id)
            .arg(json)
            .invoke_async(&mut conn)
            .await?;
        if created == 0 {
            return Err(StoreError::DuplicateEmail {
                email: user.email.clone(),
            });
        }
        Ok(())
    }

    async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        match self.get_json::<User>(&user_key(id)).await? {
            Some(user) => Ok(Some(self.assemble_user(user).await?)),
            None => Ok(None),
        }
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn.clone();
        let id: Option<String> = cmd("GET")
            .arg(email_key(email))
            .query_async(&mut conn)
            .await?;
        match id {
            Some(id) => self.user(&id).await,
            None => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: &str,
        description: Option<&str>,
        picture_path: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let Some(mut user) = self.get_json::<User>(&user_key(id)).await? else {
            return Ok(None);
        };
        if let Some(description) = description {
            user.description = description.to_string();
        }
        if let Some(picture_path) = picture_path {
            user.picture_path = picture_path.to_string();
        }

        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&user)?;
        let _: () = cmd("SET")
            .arg(user_key(id))
            .arg(json)
            .query_async(&mut conn)
            .await?;

        Ok(Some(self.assemble_user(user).await?))
    }

    async fn toggle_friend_pair(&self, a: &str, b: &str) -> Result<FriendToggle, StoreError> {
        let mut conn = self.conn.clone();
        let (added, mut friend_ids): (i64, Vec<String>) = TOGGLE_FRIENDS_SCRIPT
            .key(friends_key(a))
            .key(friends_key(b))
            .arg(a)
            .arg(b)
            .invoke_async(&mut conn)
            .await?;
        friend_ids.sort();
        Ok(FriendToggle {
            added: added == 1,
            friend_ids,
        })
    }

    async fn friend_ids(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut ids: Vec<String> = cmd("SMEMBERS")
            .arg(friends_key(id))
            .query_async(&mut conn)
            .await?;
        ids.sort();
        Ok(ids)
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(post)?;
        let _: () = cmd("SET")
            .arg(post_key(&post.id))
            .arg(json)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        match self.get_json::<Post>(&post_key(id)).await? {
            Some(post) => Ok(Some(self.assemble_post(post).await?)),
            None => Ok(None),
        }
    }

    async fn all_posts(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts = Vec::new();
        for id in self.post_ids().await? {
            // A post can vanish between the scan and the read.
            if let Some(post) = self.post(&id).await? {
                posts.push(post);
            }
        }
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.all_posts().await?;
        posts.retain(|post| post.user_id == user_id);
        Ok(posts)
    }

    async fn toggle_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Option<(Post, bool)>, StoreError> {
        let mut conn = self.conn.clone();
        let outcome: Option<i64> = TOGGLE_LIKE_SCRIPT
            .key(post_key(post_id))
            .key(likes_key(post_id))
            .arg(user_id)
            .invoke_async(&mut conn)
            .await?;
        let Some(liked) = outcome else {
            return Ok(None);
        };
        match self.post(post_id).await? {
            Some(post) => Ok(Some((post, liked == 1))),
            None => Ok(None),
        }
    }

    async fn append_comment(
        &self,
        post_id: &str,
        comment: &Comment,
    ) -> Result<Option<Post>, StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(comment)?;
        let appended: Option<i64> = APPEND_COMMENT_SCRIPT
            .key(post_key(post_id))
            .key(comments_key(post_id))
            .arg(json)
            .invoke_async(&mut conn)
            .await?;
        if appended.is_none() {
            return Ok(None);
        }
        self.post(post_id).await
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = cmd("DEL").arg(post_key(id)).query_async(&mut conn).await?;
        let _: i64 = cmd("DEL")
            .arg(likes_key(id))
            .arg(comments_key(id))
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(notification)?;
        let _: i64 = cmd("LPUSH")
            .arg(notifications_key(&notification.user_id))
            .arg(json)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = cmd("LRANGE")
            .arg(notifications_key(user_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}
