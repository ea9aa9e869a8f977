use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use crate::{auth::AuthUser, error::AppError, models::Post, uploads::save_upload};

/// `GET /posts` — the feed; every post, newest first.
pub async fn feed(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.posts.feed().await?))
}

/// `POST /posts` — multipart: `description` plus an optional `picture` file.
/// The post is attributed to the authenticated user.
pub async fn create_post(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(actor): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut description = String::new();
    let mut picture_path = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::InvalidInput("malformed multipart body".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "description" => {
                description = field.text().await.map_err(|_| {
                    AppError::InvalidInput("malformed description field".to_string())
                })?;
            }
            "picture" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::InvalidInput("malformed picture upload".to_string()))?;
                if !bytes.is_empty() {
                    picture_path =
                        Some(save_upload(&state.config.assets_dir, &filename, &bytes).await?);
                }
            }
            other => warn!(field = %other, "ignoring unknown post field"),
        }
    }

    let post = state.posts.create(&actor, description, picture_path).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /posts/{id}/posts` — one user's posts, newest first. The path
/// parameter is the user id.
pub async fn user_posts(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.posts.posts_by(&id).await?))
}

/// `PATCH /posts/{id}/like` — toggle the authenticated user's like.
pub async fn like_post(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(state.posts.like(&id, &actor).await?))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

/// `PATCH /posts/{id}/comment`
pub async fn comment_post(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(state.posts.comment(&id, &actor, &payload.comment).await?))
}

/// `PATCH /posts/{id}/share` — create a share-copy attributed to the
/// authenticated user.
pub async fn share_post(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(state.posts.share(&id, &actor).await?))
}

/// `DELETE /posts/{id}` — owner only.
pub async fn delete_post(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.posts.delete(&id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
