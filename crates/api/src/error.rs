//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures elevated errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::access::{AccessError, Denial};
use crate::db::RepositoryError;
use crate::models::InvalidField;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Login, logout or session lookup failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The authorization engine refused the request.
    #[error("{0}")]
    Denied(#[from] Denial),

    /// Authorization could not be evaluated.
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// A body field failed validation.
    #[error("{0}")]
    Invalid(#[from] InvalidField),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors that indicate a fault on our side or in a dependency.
    const fn is_elevated(&self) -> bool {
        match self {
            Self::Database(err) | Self::Access(AccessError::Repository(err)) => {
                is_repository_fault(err)
            }
            Self::Auth(err) => matches!(
                err,
                AuthError::AuthServiceUnavailable(_)
                    | AuthError::Repository(_)
                    | AuthError::Session(_)
            ),
            Self::Access(AccessError::SessionIdentityMissing(_)) | Self::Internal(_) => true,
            Self::Denied(_) | Self::Invalid(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// HTTP status this error is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) | Self::Access(AccessError::Repository(err)) => {
                repository_status(err)
            }
            Self::Auth(err) => match err {
                AuthError::MalformedRequest(_) | AuthError::MissingCredentials => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotRegistered => StatusCode::NOT_FOUND,
                AuthError::AuthServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                AuthError::Repository(_) | AuthError::Session(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Denied(denial) => match denial {
                Denial::Unauthorized => StatusCode::UNAUTHORIZED,
                Denial::Forbidden => StatusCode::FORBIDDEN,
                Denial::NotFound => StatusCode::NOT_FOUND,
            },
            Self::Access(AccessError::SessionIdentityMissing(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Invalid(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown to the client. Internal details never leave the process.
    fn public_message(&self) -> String {
        match self {
            Self::Database(err) | Self::Access(AccessError::Repository(err)) => match err {
                RepositoryError::NotFound => "Resource not found.".to_owned(),
                RepositoryError::Conflict(msg) | RepositoryError::MissingReference(msg) => {
                    capitalize(msg)
                }
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "Internal server error".to_owned()
                }
            },
            Self::Auth(err) => match err {
                AuthError::MalformedRequest(detail) => {
                    format!("Request must be a JSON object with an email and password: {detail}")
                }
                AuthError::MissingCredentials => "Email and password are required.".to_owned(),
                AuthError::InvalidCredentials => "Invalid email or password.".to_owned(),
                AuthError::UserNotRegistered => "User is not registered in the system.".to_owned(),
                AuthError::AuthServiceUnavailable(_) => {
                    "Unable to reach the authentication service.".to_owned()
                }
                AuthError::Repository(_) | AuthError::Session(_) => {
                    "Internal server error".to_owned()
                }
            },
            Self::Access(AccessError::SessionIdentityMissing(_)) | Self::Internal(_) => {
                "Internal server error".to_owned()
            }
            Self::Denied(denial) => denial.to_string(),
            Self::Invalid(err) => err.to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

const fn is_repository_fault(err: &RepositoryError) -> bool {
    matches!(
        err,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
    )
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound | RepositoryError::MissingReference(_) => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_elevated() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful login.
pub fn set_sentry_user(user_email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(user_email.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::VerifierError;
    use trails_core::Email;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("trail 4".to_owned());
        assert_eq!(err.to_string(), "Not found: trail 4");

        let err = AppError::Denied(Denial::Unauthorized);
        assert_eq!(err.to_string(), "Unauthorized: Please log in.");
    }

    #[test]
    fn test_denial_status_codes() {
        assert_eq!(
            get_status(Denial::Unauthorized.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(Denial::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(get_status(Denial::NotFound.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            get_status(AuthError::MalformedRequest("not json".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::MissingCredentials.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserNotRegistered.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                AuthError::AuthServiceUnavailable(VerifierError::UnexpectedBody(
                    "[]".to_owned()
                ))
                .into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_integrity_faults_are_internal() {
        let missing = AccessError::SessionIdentityMissing(Email::parse("gone@x.com").unwrap());
        assert_eq!(
            get_status(missing.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad row".to_owned()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_status_codes() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("trail still has comments".to_owned()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::MissingReference("location does not exist".to_owned()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Access(AccessError::SessionIdentityMissing(
            Email::parse("gone@x.com").unwrap(),
        ));
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("trail still has comments".to_owned()))
                .public_message(),
            "Trail still has comments."
        );
    }
}
