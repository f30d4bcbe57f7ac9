use thiserror::Error;

use crate::models::Role;

/// Failures surfaced by the store, the identity/session/reset core and the
/// portal command handlers. None of them are fatal; the CLI prints the
/// message and exits non-zero.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password or reset code does not match")]
    CredentialMismatch,

    #[error("Reset code expired, request a new one")]
    ExpiredTicket,

    #[error("No password reset pending")]
    NoPendingReset,

    #[error("Please login first")]
    NotLoggedIn,

    #[error("Login as {needed} to do this")]
    WrongRole { needed: Role },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Corrupted value under '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;
