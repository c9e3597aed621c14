//! Authentication error types.

use thiserror::Error;

use super::verifier::VerifierError;
use crate::db::RepositoryError;

/// Errors that can occur during login, logout and session lookup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Body missing, not JSON, or email not shaped like an address.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Email or password empty.
    #[error("email and password are required")]
    MissingCredentials,

    /// The identity verifier rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Verified, but the strict login policy found no local identity.
    #[error("user is not registered")]
    UserNotRegistered,

    /// The identity verifier could not give an answer.
    #[error("authentication service unavailable: {0}")]
    AuthServiceUnavailable(#[from] VerifierError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
