//! Tag endpoints, scoped to the requesting owner.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch};
use axum::{Json, Router};
use famcal_core::{FamcalError, Tag};
use serde::Deserialize;

use crate::routes::{require_user, ApiError};
use crate::state::AppState;
use crate::store::{NewTag, TagPatch};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/{id}", patch(update_tag))
}

#[derive(Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
}

#[derive(Deserialize, Default)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// GET /api/tags - the caller's tags, sorted by name
async fn list_tags(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;
    Ok(Json(state.store.list_tags(&user.id).await?))
}

/// POST /api/tags - create a tag owned by the caller
async fn create_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;

    if req.name.trim().is_empty() {
        return Err(FamcalError::Validation("name is required".to_string()).into());
    }
    if req.color.trim().is_empty() {
        return Err(FamcalError::Validation("color is required".to_string()).into());
    }

    let tag = state
        .store
        .create_tag(NewTag {
            name: req.name,
            color: req.color,
            user_id: user.id,
        })
        .await?;
    Ok(Json(tag))
}

/// PATCH /api/tags/:id - partial rename/recolor of an owned tag
async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;

    let tag = state
        .store
        .update_tag(
            &id,
            &user.id,
            TagPatch {
                name: req.name,
                color: req.color,
            },
        )
        .await?;
    Ok(Json(tag))
}
