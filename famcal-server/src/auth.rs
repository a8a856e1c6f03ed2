//! Client for the external identity provider.
//!
//! The provider speaks a GoTrue-compatible API: `GET /auth/v1/user` resolves
//! a session token to a user, `PUT /auth/v1/user` changes the password.
//! Sessions themselves are issued and validated by the provider; this server
//! only forwards the opaque token it finds on the request.

use axum::http::HeaderMap;
use famcal_core::{FamcalError, FamcalResult};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AuthConfig;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "famcal-session";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        AuthClient {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// Resolve a session token to the user it belongs to.
    pub async fn get_user(&self, token: &str) -> FamcalResult<AuthUser> {
        let res = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| FamcalError::Provider(e.to_string()))?;

        match res.status() {
            s if s.is_success() => res
                .json::<AuthUser>()
                .await
                .map_err(|e| FamcalError::Provider(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FamcalError::Unauthorized),
            s => Err(FamcalError::Provider(format!(
                "unexpected status {s} from user lookup"
            ))),
        }
    }

    /// Change the password behind the given session.
    pub async fn update_password(&self, token: &str, new_password: &str) -> FamcalResult<()> {
        let res = self
            .http
            .put(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await
            .map_err(|e| FamcalError::Provider(e.to_string()))?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FamcalError::Unauthorized),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let message = res
                    .json::<ProviderError>()
                    .await
                    .ok()
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "password rejected by auth provider".to_string());
                Err(FamcalError::Validation(message))
            }
            s => Err(FamcalError::Provider(format!(
                "unexpected status {s} from password update"
            ))),
        }
    }
}

/// Extract the session token from the request: the session cookie first,
/// then a bearer Authorization header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(axum::http::header::COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookies.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(SESSION_COOKIE) {
                if let Some(value) = parts.next() {
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
