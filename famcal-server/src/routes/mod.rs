//! HTTP route handlers and the error-to-response mapping.

pub mod events;
pub mod health;
pub mod profile;
pub mod tags;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use famcal_core::FamcalError;
use serde::Serialize;
use tracing::error;

use crate::auth::{session_token, AuthUser};
use crate::state::AppState;

/// Standard API error body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper turning domain errors into HTTP responses.
///
/// Validation and authorization failures carry their specific message;
/// persistence and provider failures are logged and collapsed into a
/// generic 500 body.
pub struct ApiError(FamcalError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            FamcalError::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            FamcalError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            FamcalError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<FamcalError> for ApiError {
    fn from(err: FamcalError) -> Self {
        ApiError(err)
    }
}

/// Resolve the request's session to a user, or fail with 401.
///
/// Returns the token alongside the user because the password-change flow
/// has to forward it to the provider.
pub async fn require_user(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<(String, AuthUser), ApiError> {
    let token = session_token(headers).ok_or(FamcalError::Unauthorized)?;
    let user = state.auth.get_user(&token).await?;
    Ok((token, user))
}
