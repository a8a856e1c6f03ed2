//! Profile and password-change endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use famcal_core::{FamcalError, UserProfile};
use serde::{Deserialize, Serialize};

use crate::routes::{require_user, ApiError};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/profile", get(get_profile).post(upsert_profile))
        .route("/api/auth/change-password", post(change_password))
}

/// Profile wire shape with the derived expiry booleans.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub password_expires_at: DateTime<Utc>,
    /// Stored flag OR computed expiry; what the UI acts on.
    pub password_change_required: bool,
    pub is_password_expired: bool,
}

impl ProfileResponse {
    fn from_profile(profile: &UserProfile, now: DateTime<Utc>) -> Self {
        ProfileResponse {
            id: profile.id.clone(),
            user_id: profile.user_id.clone(),
            email: profile.email.clone(),
            password_expires_at: profile.password_expires_at,
            password_change_required: profile.needs_password_change(now),
            is_password_expired: profile.is_password_expired(now),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct UpsertProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    pub message: String,
    pub password_expires_at: DateTime<Utc>,
}

/// GET /api/auth/profile - the caller's profile with derived expiry state
async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;

    let profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| FamcalError::NotFound("profile".to_string()))?;

    Ok(Json(ProfileResponse::from_profile(&profile, Utc::now())))
}

/// POST /api/auth/profile - idempotent upsert keyed by the session user.
///
/// First creation also seeds the default tag set for the new user.
async fn upsert_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (_, user) = require_user(&state, &headers).await?;

    let email = req.email.or(user.email.clone()).unwrap_or_default();
    let (profile, created) = state
        .store
        .upsert_profile(&user.id, &email, state.config.password_expiry_days)
        .await?;

    if created {
        state.store.seed_default_tags(&user.id).await?;
    }

    Ok(Json(ProfileResponse::from_profile(&profile, Utc::now())))
}

/// POST /api/auth/change-password - forward to the provider, then reset
/// the expiry window
async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    let (token, user) = require_user(&state, &headers).await?;

    if req.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(FamcalError::Validation(
            "Password must be at least 6 characters".to_string(),
        )
        .into());
    }

    state.auth.update_password(&token, &req.new_password).await?;

    let email = user.email.unwrap_or_default();
    let (profile, _) = state
        .store
        .upsert_profile(&user.id, &email, state.config.password_expiry_days)
        .await?;

    Ok(Json(ChangePasswordResponse {
        message: "Password updated successfully".to_string(),
        password_expires_at: profile.password_expires_at,
    }))
}
