use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{hash_password, issue_token, verify_password},
    error::AppError,
    models::{User, UserView, new_id},
    uploads::save_upload,
};

#[derive(Default)]
struct RegisterForm {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    location: String,
    occupation: String,
    picture: Option<(String, Bytes)>,
}

/// `POST /auth/register` — multipart: profile fields plus an optional
/// `picture` file.
pub async fn register(
    State(state): State<Arc<crate::state::State>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = RegisterForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::InvalidInput("malformed multipart body".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "picture" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::InvalidInput("malformed picture upload".to_string()))?;
            if !bytes.is_empty() {
                form.picture = Some((filename, bytes));
            }
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|_| AppError::InvalidInput(format!("malformed field {name}")))?;
        match name.as_str() {
            "firstName" => form.first_name = value,
            "lastName" => form.last_name = value,
            "email" => form.email = value,
            "password" => form.password = value,
            "location" => form.location = value,
            "occupation" => form.occupation = value,
            other => warn!(field = %other, "ignoring unknown register field"),
        }
    }

    validate_name("firstName", &form.first_name)?;
    validate_name("lastName", &form.last_name)?;
    if form.email.parse::<EmailAddress>().is_err() {
        return Err(AppError::InvalidInput("invalid email address".to_string()));
    }
    if form.password.chars().count() < 5 {
        return Err(AppError::InvalidInput(
            "password must be at least 5 characters".to_string(),
        ));
    }

    let picture_path = match &form.picture {
        Some((filename, bytes)) => save_upload(&state.config.assets_dir, filename, bytes).await?,
        None => String::new(),
    };

    let user = User {
        id: new_id(),
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        password_hash: hash_password(&form.password)?,
        picture_path,
        description: String::new(),
        location: form.location,
        occupation: form.occupation,
        friends: Vec::new(),
        viewed_profile: 0,
        impressions: 0,
        created_at: Utc::now(),
    };
    state.store.insert_user(&user).await?;
    if let Err(err) = state.search.index_user(&user).await {
        warn!(user_id = %user.id, error = %err, "failed to index user");
    }
    info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(AppError::InvalidInput(format!(
            "{field} must be 2 to 50 characters"
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// `POST /auth/login` — verifies the credential and issues a bearer token.
pub async fn login(
    State(state): State<Arc<crate::state::State>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .store
        .user_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = issue_token(
        &user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
    )?;
    Ok(Json(LoginResponse {
        token,
        user: UserView::from(&user),
    }))
}
