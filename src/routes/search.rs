use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{error::AppError, search::SearchResults};

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// `GET /search?query=` — case-insensitive match over user names and post
/// descriptions. Public endpoint.
pub async fn search_handler(
    State(state): State<Arc<crate::state::State>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, AppError> {
    if params.query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "query parameter is required".to_string(),
        ));
    }
    Ok(Json(state.search.search(params.query.trim()).await?))
}
