//! Locations backed by `trails.location`.

use sqlx::PgPool;

use trails_core::LocationId;

use super::{LocationStore, RepositoryError};
use crate::models::{Location, NewLocation};

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    id: i32,
    name: String,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: LocationId::new(row.id),
            name: row.name,
        }
    }
}

/// Repository for location operations.
pub struct LocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl LocationStore for LocationRepository<'_> {
    async fn list_locations(&self) -> Result<Vec<Location>, RepositoryError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name FROM trails.location ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepositoryError> {
        let row =
            sqlx::query_as::<_, LocationRow>("SELECT id, name FROM trails.location WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn create_location(&self, location: &NewLocation) -> Result<Location, RepositoryError> {
        let row = sqlx::query_as::<_, LocationRow>(
            "INSERT INTO trails.location (name) VALUES ($1) RETURNING id, name",
        )
        .bind(location.name.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
