//! Error types shared across the famcal crates.

use thiserror::Error;

/// Errors that can occur in famcal operations.
///
/// The HTTP layer maps these onto status codes: `Unauthorized` -> 401,
/// `NotFound` -> 404, `Validation` -> 400, everything else -> 500 with a
/// generic body.
#[derive(Error, Debug)]
pub enum FamcalError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Auth provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for famcal operations.
pub type FamcalResult<T> = Result<T, FamcalError>;
