//! Server configuration.
//!
//! Loaded from `famcal.toml` in the working directory (or the file named by
//! `FAMCAL_CONFIG`), with a handful of environment overrides on top. Every
//! field has a default so the server starts with no config file at all.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use famcal_core::{FamcalError, FamcalResult};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// Time zone assumed for events that don't specify one.
    pub default_time_zone: String,
    /// Rolling validity window for passwords, in days.
    pub password_expiry_days: i64,
    pub auth: AuthConfig,
}

/// Connection details for the external identity provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the provider, without the `/auth/v1` suffix.
    pub base_url: String,
    /// Public API key sent alongside every request.
    pub anon_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4280)),
            database_path: PathBuf::from("famcal.db"),
            default_time_zone: "UTC".to_string(),
            password_expiry_days: 15,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            base_url: "http://localhost:9999".to_string(),
            anon_key: String::new(),
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> FamcalResult<Self> {
        let path = std::env::var("FAMCAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("famcal.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };

        if let Ok(addr) = std::env::var("FAMCAL_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| FamcalError::Config(format!("invalid FAMCAL_BIND_ADDR: {addr}")))?;
        }
        if let Ok(db) = std::env::var("FAMCAL_DATABASE_PATH") {
            config.database_path = PathBuf::from(db);
        }
        if let Ok(url) = std::env::var("FAMCAL_AUTH_URL") {
            config.auth.base_url = url;
        }
        if let Ok(key) = std::env::var("FAMCAL_AUTH_ANON_KEY") {
            config.auth.anon_key = key;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> FamcalResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FamcalError::Config(format!("could not read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| FamcalError::Config(format!("could not parse {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_stand_alone() {
        let config = Config::default();
        assert_eq!(config.password_expiry_days, 15);
        assert_eq!(config.default_time_zone, "UTC");
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: Config = toml::from_str(
            r#"
            default_time_zone = "Europe/Berlin"

            [auth]
            base_url = "https://auth.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_time_zone, "Europe/Berlin");
        assert_eq!(config.auth.base_url, "https://auth.example.com");
        assert_eq!(config.password_expiry_days, 15);
    }
}
