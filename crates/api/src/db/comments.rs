//! Comments backed by `trails.comment`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use trails_core::{CommentId, TrailId, UserId};

use super::{CommentStore, RepositoryError, map_constraint_error};
use crate::models::Comment;

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    trail_id: i32,
    user_id: i32,
    text: String,
    created_at: DateTime<Utc>,
    archived: bool,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::new(row.id),
            trail_id: TrailId::new(row.trail_id),
            author_id: UserId::new(row.user_id),
            text: row.text,
            created_at: row.created_at,
            archived: row.archived,
        }
    }
}

/// Repository for comment operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CommentStore for CommentRepository<'_> {
    async fn list_comments(&self) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, trail_id, user_id, text, created_at, archived
            FROM trails.comment
            WHERE NOT archived
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_comments_for_trail(
        &self,
        trail_id: TrailId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, trail_id, user_id, text, created_at, archived
            FROM trails.comment
            WHERE trail_id = $1 AND NOT archived
            ORDER BY created_at, id
            ",
        )
        .bind(trail_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, trail_id, user_id, text, created_at, archived
            FROM trails.comment
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_comment(
        &self,
        trail_id: TrailId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO trails.comment (trail_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, trail_id, user_id, text, created_at, archived
            ",
        )
        .bind(trail_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            map_constraint_error(e, "comment already exists", "trail or author does not exist")
        })?;

        Ok(row.into())
    }

    async fn update_comment_text(
        &self,
        id: CommentId,
        text: &str,
    ) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            UPDATE trails.comment
            SET text = $2
            WHERE id = $1 AND NOT archived
            RETURNING id, trail_id, user_id, text, created_at, archived
            ",
        )
        .bind(id)
        .bind(text)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn archive_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        // Only ever sets the flag; there is no statement that clears it.
        let result = sqlx::query("UPDATE trails.comment SET archived = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
