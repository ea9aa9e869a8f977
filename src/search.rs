//! # Search
//!
//! Thin substring-style lookup over user names and post descriptions,
//! proxied through the backend rather than exposing the engine directly.
//!
//! Service mode indexes into Meilisearch; standalone mode (and the test
//! suite) uses the in-memory adapter, which implements the contract
//! literally: case-insensitive substring match, at most ten hits per kind.
//! Index writes ride along domain mutations and are eventually consistent;
//! a failed index write is logged and never fails the request that caused it.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use meilisearch_sdk::{client::Client, settings::Settings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::AppError,
    models::{Post, User},
};

pub const USER_INDEX: &str = "users";
pub const POST_INDEX: &str = "posts";
pub const DOC_ID: &str = "id";
const RESULT_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("meilisearch error: {0}")]
    Meili(#[from] meilisearch_sdk::errors::Error),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        AppError::internal(err)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHit {
    pub id: String,
    pub name: String,
    pub picture_path: String,
}

impl From<&User> for UserHit {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: format!("{} {}", user.first_name, user.last_name),
            picture_path: user.picture_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostHit {
    pub id: String,
    pub user_id: String,
    pub description: String,
    #[serde(default)]
    pub picture_path: Option<String>,
}

impl From<&Post> for PostHit {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            description: post.description.clone(),
            picture_path: post.picture_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub users: Vec<UserHit>,
    pub posts: Vec<PostHit>,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index_user(&self, user: &User) -> Result<(), SearchError>;
    async fn index_post(&self, post: &Post) -> Result<(), SearchError>;
    async fn remove_post(&self, post_id: &str) -> Result<(), SearchError>;
    /// Matches over user names and post descriptions only.
    async fn search(&self, query: &str) -> Result<SearchResults, SearchError>;
}

pub struct MeiliIndex {
    client: Arc<Client>,
}

pub async fn init_meilisearch(meili_url: &str, meili_admin_key: &str) -> MeiliIndex {
    let client = Arc::new(Client::new(meili_url, Some(meili_admin_key)).unwrap());

    client
        .index(USER_INDEX)
        .set_settings(&Settings::new().with_searchable_attributes(["name"]))
        .await
        .unwrap();
    client
        .index(POST_INDEX)
        .set_settings(&Settings::new().with_searchable_attributes(["description"]))
        .await
        .unwrap();

    MeiliIndex { client }
}

#[async_trait]
impl SearchIndex for MeiliIndex {
    async fn index_user(&self, user: &User) -> Result<(), SearchError> {
        self.client
            .index(USER_INDEX)
            .add_or_update(&[UserHit::from(user)], Some(DOC_ID))
            .await?;
        Ok(())
    }

    async fn index_post(&self, post: &Post) -> Result<(), SearchError> {
        self.client
            .index(POST_INDEX)
            .add_or_update(&[PostHit::from(post)], Some(DOC_ID))
            .await?;
        Ok(())
    }

    async fn remove_post(&self, post_id: &str) -> Result<(), SearchError> {
        self.client.index(POST_INDEX).delete_document(post_id).await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        let users = self
            .client
            .index(USER_INDEX)
            .search()
            .with_query(query)
            .with_limit(RESULT_LIMIT)
            .execute::<UserHit>()
            .await?;
        let posts = self
            .client
            .index(POST_INDEX)
            .search()
            .with_query(query)
            .with_limit(RESULT_LIMIT)
            .execute::<PostHit>()
            .await?;

        Ok(SearchResults {
            users: users.hits.into_iter().map(|hit| hit.result).collect(),
            posts: posts.hits.into_iter().map(|hit| hit.result).collect(),
        })
    }
}

/// Case-insensitive substring matching over in-memory hit lists.
#[derive(Default)]
pub struct MemoryIndex {
    users: RwLock<Vec<UserHit>>,
    posts: RwLock<Vec<PostHit>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_user(&self, user: &User) -> Result<(), SearchError> {
        let mut users = self.users.write().unwrap();
        let hit = UserHit::from(user);
        match users.iter_mut().find(|existing| existing.id == hit.id) {
            Some(existing) => *existing = hit,
            None => users.push(hit),
        }
        Ok(())
    }

    async fn index_post(&self, post: &Post) -> Result<(), SearchError> {
        let mut posts = self.posts.write().unwrap();
        let hit = PostHit::from(post);
        match posts.iter_mut().find(|existing| existing.id == hit.id) {
            Some(existing) => *existing = hit,
            None => posts.push(hit),
        }
        Ok(())
    }

    async fn remove_post(&self, post_id: &str) -> Result<(), SearchError> {
        self.posts.write().unwrap().retain(|hit| hit.id != post_id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        let needle = query.to_lowercase();

        let users = self
            .users
            .read()
            .unwrap()
            .iter()
            .filter(|hit| hit.name.to_lowercase().contains(&needle))
            .take(RESULT_LIMIT)
            .cloned()
            .collect();
        let posts = self
            .posts
            .read()
            .unwrap()
            .iter()
            .filter(|hit| hit.description.to_lowercase().contains(&needle))
            .take(RESULT_LIMIT)
            .cloned()
            .collect();

        Ok(SearchResults { users, posts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_hit(id: &str, description: &str) -> PostHit {
        PostHit {
            id: id.to_string(),
            user_id: "owner".to_string(),
            description: description.to_string(),
            picture_path: None,
        }
    }

    #[tokio::test]
    async fn returns_only_matching_posts() {
        let index = MemoryIndex::new();
        index.posts.write().unwrap().push(post_hit("1", "red car"));
        index.posts.write().unwrap().push(post_hit("2", "blue bike"));

        let results = index.search("car").await.unwrap();
        assert_eq!(results.posts.len(), 1);
        assert_eq!(results.posts[0].description, "red car");
        assert!(results.users.is_empty());
    }

    #[tokio::test]
    async fn matches_user_names_case_insensitively() {
        let index = MemoryIndex::new();
        index.users.write().unwrap().push(UserHit {
            id: "u1".to_string(),
            name: "Ada Lovelace".to_string(),
            picture_path: String::new(),
        });

        let results = index.search("lovel").await.unwrap();
        assert_eq!(results.users.len(), 1);
        assert!(index.search("turing").await.unwrap().users.is_empty());
    }

    #[tokio::test]
    async fn removed_posts_stop_matching() {
        let index = MemoryIndex::new();
        index.posts.write().unwrap().push(post_hit("1", "red car"));

        index.remove_post("1").await.unwrap();
        assert!(index.search("car").await.unwrap().posts.is_empty());
    }
}
