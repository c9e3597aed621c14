//! User directory commands.
//!
//! Roles are only ever assigned here; the API itself never promotes anyone.
//!
//! # Usage
//!
//! ```bash
//! trails-cli user create -e walker@example.com -r admin
//! trails-cli user set-role -e walker@example.com -r user
//! ```
//!
//! # Environment Variables
//!
//! - `TRAILS_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;
use trails_api::db::{self, RepositoryError, UserDirectory, UserRepository};
use trails_core::{Email, Role, UserId};

/// Errors that can occur during user management.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: TRAILS_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email {0}: {1}")]
    InvalidEmail(String, String),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(Email),

    /// No user with this email.
    #[error("No user registered with email: {0}")]
    UnknownUser(Email),

    /// Other repository failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

fn parse_args(email: &str, role: &str) -> Result<(Email, Role), UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email =
        Email::parse(email).map_err(|e| UserError::InvalidEmail(email.to_owned(), e.to_string()))?;
    Ok((email, role))
}

async fn connect() -> Result<sqlx::PgPool, UserError> {
    let database_url = super::database_url().ok_or(UserError::MissingDatabaseUrl)?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Register a new user.
///
/// # Returns
///
/// The id of the created user.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the email is already
/// registered, or the database is unreachable.
pub async fn create_user(email: &str, role: &str) -> Result<UserId, UserError> {
    let (email, role) = parse_args(email, role)?;
    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", email, role);
    let identity = UserRepository::new(&pool)
        .create_user(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.clone()),
            other => UserError::Repository(other),
        })?;

    Ok(identity.id)
}

/// Change the role of an existing user.
///
/// Active sessions keep the role they were established with; the change is
/// seen on the user's next login.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, no user has this email, or
/// the database is unreachable.
pub async fn set_role(email: &str, role: &str) -> Result<(), UserError> {
    let (email, role) = parse_args(email, role)?;
    let pool = connect().await?;

    UserRepository::new(&pool)
        .set_role(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::UnknownUser(email.clone()),
            other => UserError::Repository(other),
        })?;

    tracing::info!("Role of {} set to {}", email, role);
    Ok(())
}
