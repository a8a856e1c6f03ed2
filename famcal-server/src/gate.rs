//! Access gate: per-request authentication and password-expiry check.
//!
//! Runs ahead of every route. Public paths pass through untouched; anything
//! else needs a resolvable session, and sessions whose profile reports an
//! expired or force-changed password are redirected into the
//! password-change flow. A failing profile lookup fails open: the profile
//! is created lazily on the next successful API call, so a missing or
//! unreadable row must not lock the user out.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use famcal_core::FamcalError;
use tracing::warn;

use crate::auth::session_token;
use crate::state::AppState;

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";

/// Paths reachable without a session. The change-password API is listed so
/// that expired users can actually complete the flow; the handlers behind
/// it still demand a valid session themselves.
const PUBLIC_PATHS: [&str; 7] = [
    SIGN_IN_PATH,
    "/auth/sign-up",
    CHANGE_PASSWORD_PATH,
    "/api/auth/change-password",
    "/api/health",
    "/assets",
    "/favicon.ico",
];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

fn redirect_to_sign_in(original: &str) -> Response {
    let target = format!("{SIGN_IN_PATH}?redirect={}", urlencoding::encode(original));
    Redirect::to(&target).into_response()
}

pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return next.run(req).await;
    }

    let Some(token) = session_token(req.headers()) else {
        return redirect_to_sign_in(&path);
    };

    let user = match state.auth.get_user(&token).await {
        Ok(user) => user,
        Err(FamcalError::Unauthorized) => return redirect_to_sign_in(&path),
        Err(err) => {
            warn!(error = %err, path, "session check against auth provider failed");
            return redirect_to_sign_in(&path);
        }
    };

    match state.store.get_profile(&user.id).await {
        Ok(Some(profile)) if profile.needs_password_change(Utc::now()) => {
            Redirect::to(&format!("{CHANGE_PASSWORD_PATH}?reason=expired")).into_response()
        }
        // No profile yet: it will be created lazily after sign-in.
        Ok(_) => next.run(req).await,
        Err(err) => {
            // Fail open, but loudly and distinct from an auth failure.
            warn!(error = %err, path, user_id = %user.id, "profile fetch failed; allowing request");
            next.run(req).await
        }
    }
}
