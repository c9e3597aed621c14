//! Trail catalog backed by `trails.trail` and `trails.trail_log`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use trails_core::{Email, LocationId, TrailId, TrailLogId};

use super::{RepositoryError, TrailStore, map_constraint_error};
use crate::models::{Trail, TrailDetails, TrailLogEntry};

const TRAIL_COLUMNS: &str = "id, name, rating, difficulty, distance, est_time, route_type, \
                             description, location_id";

#[derive(Debug, sqlx::FromRow)]
struct TrailRow {
    id: i32,
    name: String,
    rating: Option<Decimal>,
    difficulty: String,
    distance: Decimal,
    est_time: String,
    route_type: String,
    description: String,
    location_id: i32,
}

impl From<TrailRow> for Trail {
    fn from(row: TrailRow) -> Self {
        Self {
            id: TrailId::new(row.id),
            details: TrailDetails {
                name: row.name,
                rating: row.rating,
                difficulty: row.difficulty,
                distance: row.distance,
                est_time: row.est_time,
                route_type: row.route_type,
                description: row.description,
                location_id: LocationId::new(row.location_id),
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrailLogRow {
    id: i32,
    trail_id: i32,
    added_by: String,
    added_on: DateTime<Utc>,
}

impl From<TrailLogRow> for TrailLogEntry {
    fn from(row: TrailLogRow) -> Self {
        Self {
            id: TrailLogId::new(row.id),
            trail_id: TrailId::new(row.trail_id),
            added_by: row.added_by,
            added_on: row.added_on,
        }
    }
}

/// Repository for trail operations.
pub struct TrailRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrailRepository<'a> {
    /// Create a new trail repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl TrailStore for TrailRepository<'_> {
    async fn list_trails(&self) -> Result<Vec<Trail>, RepositoryError> {
        let rows = sqlx::query_as::<_, TrailRow>(&format!(
            "SELECT {TRAIL_COLUMNS} FROM trails.trail ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_trail(&self, id: TrailId) -> Result<Option<Trail>, RepositoryError> {
        let row = sqlx::query_as::<_, TrailRow>(&format!(
            "SELECT {TRAIL_COLUMNS} FROM trails.trail WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_trail(
        &self,
        details: &TrailDetails,
        added_by: &Email,
    ) -> Result<Trail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TrailRow>(&format!(
            r"
            INSERT INTO trails.trail
                (name, rating, difficulty, distance, est_time, route_type, description, location_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRAIL_COLUMNS}
            "
        ))
        .bind(&details.name)
        .bind(details.rating)
        .bind(&details.difficulty)
        .bind(details.distance)
        .bind(&details.est_time)
        .bind(&details.route_type)
        .bind(&details.description)
        .bind(details.location_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "trail already exists", "location does not exist"))?;

        sqlx::query("INSERT INTO trails.trail_log (trail_id, added_by) VALUES ($1, $2)")
            .bind(row.id)
            .bind(added_by.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn update_trail(
        &self,
        id: TrailId,
        details: &TrailDetails,
    ) -> Result<Trail, RepositoryError> {
        let row = sqlx::query_as::<_, TrailRow>(&format!(
            r"
            UPDATE trails.trail
            SET name = $2, rating = $3, difficulty = $4, distance = $5,
                est_time = $6, route_type = $7, description = $8, location_id = $9
            WHERE id = $1
            RETURNING {TRAIL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&details.name)
        .bind(details.rating)
        .bind(&details.difficulty)
        .bind(details.distance)
        .bind(&details.est_time)
        .bind(&details.route_type)
        .bind(&details.description)
        .bind(details.location_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "trail already exists", "location does not exist"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_trail(&self, id: TrailId) -> Result<(), RepositoryError> {
        // comment.trail_id is ON DELETE RESTRICT, so a trail with comments
        // surfaces as a foreign key violation here.
        let result = sqlx::query("DELETE FROM trails.trail WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict("trail still has comments".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn trail_log(&self, id: TrailId) -> Result<Vec<TrailLogEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, TrailLogRow>(
            r"
            SELECT id, trail_id, added_by, added_on
            FROM trails.trail_log
            WHERE trail_id = $1
            ORDER BY added_on, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
