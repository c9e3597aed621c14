//! User directory backed by `trails.app_user`.

use sqlx::PgPool;

use trails_core::{Email, Role, UserId};

use super::{RepositoryError, UserDirectory};
use crate::models::Identity;

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    role: Role,
}

impl TryFrom<UserRow> for Identity {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            role: row.role,
        })
    }
}

/// Repository for user directory operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for UserRepository<'_> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role FROM trails.app_user WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role FROM trails.app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_or_create(&self, email: &Email) -> Result<Identity, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict,
        // so concurrent first logins all observe the same identity.
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO trails.app_user (email, role)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, role
            ",
        )
        .bind(email.as_str())
        .bind(Role::User)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    async fn create_user(&self, email: &Email, role: Role) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO trails.app_user (email, role)
            VALUES ($1, $2)
            RETURNING id, email, role
            ",
        )
        .bind(email.as_str())
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE trails.app_user
            SET role = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING id, email, role
            ",
        )
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
