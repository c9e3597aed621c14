//! Persistence for the Trails API.
//!
//! # Schema: `trails`
//!
//! ## Tables
//!
//! - `app_user` - Local user directory (unique email, role)
//! - `location` - Places trails start from
//! - `trail` - Trail catalog
//! - `comment` - Trail comments, soft-deleted through `archived`
//! - `trail_log` - Audit entries written when a trail is created
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p trails-cli -- migrate
//! ```
//!
//! Each table is reached through a store trait so request handling can run
//! against `PostgreSQL` in production and [`memory::InMemoryStore`] in tests.

pub mod comments;
pub mod locations;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod trails;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use trails_core::{CommentId, Email, LocationId, Role, TrailId, UserId};

use crate::models::{
    Comment, Identity, Location, NewLocation, Trail, TrailDetails, TrailLogEntry,
};

pub use comments::CommentRepository;
pub use locations::LocationRepository;
pub use trails::TrailRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, trail still has comments).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Classify constraint failures the way every repository reports them.
pub(crate) fn map_constraint_error(
    e: sqlx::Error,
    conflict: &str,
    missing: &str,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::MissingReference(missing.to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Local user directory. Source of truth for role assignment.
pub trait UserDirectory: Send + Sync {
    /// Look an identity up by its (normalized) email.
    fn find_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Identity>, RepositoryError>> + Send;

    /// Look an identity up by its numeric id.
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<Identity>, RepositoryError>> + Send;

    /// Return the identity for `email`, creating it with [`Role::User`] if it
    /// does not exist.
    ///
    /// Must be atomic: any number of concurrent calls for one email leave
    /// exactly one identity behind and all return it.
    fn find_or_create(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Identity, RepositoryError>> + Send;

    /// Register a new identity.
    ///
    /// # Errors
    /// - `Conflict` if the email is already registered
    fn create_user(
        &self,
        email: &Email,
        role: Role,
    ) -> impl Future<Output = Result<Identity, RepositoryError>> + Send;

    /// Change the role of an existing identity.
    ///
    /// # Errors
    /// - `NotFound` if no identity has this email
    fn set_role(
        &self,
        email: &Email,
        role: Role,
    ) -> impl Future<Output = Result<Identity, RepositoryError>> + Send;
}

/// Trail catalog together with its creation log.
pub trait TrailStore: Send + Sync {
    fn list_trails(&self) -> impl Future<Output = Result<Vec<Trail>, RepositoryError>> + Send;

    fn get_trail(
        &self,
        id: TrailId,
    ) -> impl Future<Output = Result<Option<Trail>, RepositoryError>> + Send;

    /// Insert a trail and its log entry in one unit.
    ///
    /// # Errors
    /// - `MissingReference` if the location does not exist
    fn create_trail(
        &self,
        details: &TrailDetails,
        added_by: &Email,
    ) -> impl Future<Output = Result<Trail, RepositoryError>> + Send;

    /// Overwrite every mutable field of a trail.
    ///
    /// # Errors
    /// - `NotFound` if the trail does not exist
    /// - `MissingReference` if the location does not exist
    fn update_trail(
        &self,
        id: TrailId,
        details: &TrailDetails,
    ) -> impl Future<Output = Result<Trail, RepositoryError>> + Send;

    /// # Errors
    /// - `NotFound` if the trail does not exist
    /// - `Conflict` if comments (archived or not) still reference it
    fn delete_trail(&self, id: TrailId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn trail_log(
        &self,
        id: TrailId,
    ) -> impl Future<Output = Result<Vec<TrailLogEntry>, RepositoryError>> + Send;
}

/// Trail comments. Archiving is the only form of deletion.
pub trait CommentStore: Send + Sync {
    /// Every non-archived comment.
    fn list_comments(&self) -> impl Future<Output = Result<Vec<Comment>, RepositoryError>> + Send;

    /// Non-archived comments on one trail.
    fn list_comments_for_trail(
        &self,
        trail_id: TrailId,
    ) -> impl Future<Output = Result<Vec<Comment>, RepositoryError>> + Send;

    /// Fetch a comment whether or not it is archived.
    fn get_comment(
        &self,
        id: CommentId,
    ) -> impl Future<Output = Result<Option<Comment>, RepositoryError>> + Send;

    /// # Errors
    /// - `MissingReference` if the trail or author does not exist
    fn create_comment(
        &self,
        trail_id: TrailId,
        author_id: UserId,
        text: &str,
    ) -> impl Future<Output = Result<Comment, RepositoryError>> + Send;

    /// # Errors
    /// - `NotFound` if the comment does not exist or is archived
    fn update_comment_text(
        &self,
        id: CommentId,
        text: &str,
    ) -> impl Future<Output = Result<Comment, RepositoryError>> + Send;

    /// Set the archived flag. Archiving twice is not an error.
    ///
    /// # Errors
    /// - `NotFound` if the comment does not exist
    fn archive_comment(
        &self,
        id: CommentId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

pub trait LocationStore: Send + Sync {
    fn list_locations(&self)
    -> impl Future<Output = Result<Vec<Location>, RepositoryError>> + Send;

    fn get_location(
        &self,
        id: LocationId,
    ) -> impl Future<Output = Result<Option<Location>, RepositoryError>> + Send;

    fn create_location(
        &self,
        location: &NewLocation,
    ) -> impl Future<Output = Result<Location, RepositoryError>> + Send;
}
