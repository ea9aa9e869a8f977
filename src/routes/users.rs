use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use tracing::warn;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{FriendSummary, Notification, UserView},
    uploads::save_upload,
};

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    let user = state.store.user(&id).await?.ok_or(AppError::NotFound("user"))?;
    Ok(Json(UserView::from(&user)))
}

/// `PUT /users/{id}` — multipart: optional `description` and `picture`.
/// Only the profile owner may edit it.
pub async fn update_user(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(requester): AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UserView>, AppError> {
    if requester != id {
        return Err(AppError::Unauthorized);
    }

    let mut description = None;
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
                description = Some(field.text().await.map_err(|_| {
                    AppError::InvalidInput("malformed description field".to_string())
                })?);
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
            other => warn!(field = %other, "ignoring unknown profile field"),
        }
    }

    let user = state
        .store
        .update_profile(&id, description.as_deref(), picture_path.as_deref())
        .await?
        .ok_or(AppError::NotFound("user"))?;
    if let Err(err) = state.search.index_user(&user).await {
        warn!(user_id = %user.id, error = %err, "failed to reindex user");
    }

    Ok(Json(UserView::from(&user)))
}

/// `GET /users/{id}/friends`
pub async fn get_friends(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<FriendSummary>>, AppError> {
    Ok(Json(state.friends.friends_of(&id).await?))
}

/// `PATCH /users/{id}/{friend_id}` — toggle the friendship, returning the
/// first user's updated friend list. Only `{id}` may toggle their own list.
pub async fn toggle_friend(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(requester): AuthUser,
    Path((id, friend_id)): Path<(String, String)>,
) -> Result<Json<Vec<FriendSummary>>, AppError> {
    if requester != id {
        return Err(AppError::Unauthorized);
    }
    Ok(Json(state.friends.toggle_friendship(&id, &friend_id).await?))
}

/// `GET /users/{id}/notifications` — newest first.
pub async fn list_notifications(
    State(state): State<Arc<crate::state::State>>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.notifier.list(&id).await?))
}
