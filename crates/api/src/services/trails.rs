//! Trail catalog operations.

use trails_core::{Role, TrailId};

use super::guard;
use crate::access::{Denial, NoResource, Policy};
use crate::db::{RepositoryError, TrailStore};
use crate::error::{AppError, Result};
use crate::models::{AuthSession, Trail, TrailDetails, TrailLogEntry, TrailPatch};

const MANAGE: Policy = Policy::RoleGated(Role::Admin);

/// Trail catalog service. Mutations are gated purely by role.
pub struct TrailService<'a, S> {
    store: &'a S,
}

impl<'a, S: TrailStore> TrailService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, session: Option<&AuthSession>) -> Result<Vec<Trail>> {
        guard("list_trails", Policy::Public, session, &NoResource).await?;
        Ok(self.store.list_trails().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no trail has this id.
    pub async fn get(&self, session: Option<&AuthSession>, id: TrailId) -> Result<Trail> {
        guard("get_trail", Policy::Public, session, &NoResource).await?;
        self.store
            .get_trail(id)
            .await?
            .ok_or_else(|| trail_not_found(id))
    }

    /// Create a trail and record who added it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` denials for non-admins,
    /// `AppError::Invalid` for bad fields and a 404 for an unknown location.
    pub async fn create(
        &self,
        session: Option<&AuthSession>,
        details: TrailDetails,
    ) -> Result<Trail> {
        guard("create_trail", MANAGE, session, &NoResource).await?;
        let actor = session.ok_or(Denial::Unauthorized)?;

        let details = details.normalized()?;
        let trail = self.store.create_trail(&details, &actor.email).await?;

        tracing::info!(
            trail_id = %trail.id,
            name = %trail.details.name,
            added_by = %actor.email,
            "Trail created"
        );
        Ok(trail)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trail or location, `BadRequest` for
    /// an empty patch against an existing trail, and `Invalid` when the
    /// merged trail fails validation.
    pub async fn update(
        &self,
        session: Option<&AuthSession>,
        id: TrailId,
        patch: TrailPatch,
    ) -> Result<Trail> {
        guard("update_trail", MANAGE, session, &NoResource).await?;

        let existing = self
            .store
            .get_trail(id)
            .await?
            .ok_or_else(|| trail_not_found(id))?;

        if patch.is_empty() {
            return Err(AppError::BadRequest("No data provided.".to_owned()));
        }

        let details = patch.apply(existing.details).normalized()?;

        let trail = self
            .store
            .update_trail(id, &details)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => trail_not_found(id),
                other => other.into(),
            })?;

        tracing::info!(trail_id = %id, "Trail updated");
        Ok(trail)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trail and a 409 while comments still
    /// reference it.
    pub async fn delete(&self, session: Option<&AuthSession>, id: TrailId) -> Result<()> {
        guard("delete_trail", MANAGE, session, &NoResource).await?;

        self.store.delete_trail(id).await.map_err(|e| match e {
            RepositoryError::NotFound => trail_not_found(id),
            other => other.into(),
        })?;

        tracing::info!(trail_id = %id, "Trail deleted");
        Ok(())
    }

    /// Creation log of one trail.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trail.
    pub async fn log(
        &self,
        session: Option<&AuthSession>,
        id: TrailId,
    ) -> Result<Vec<TrailLogEntry>> {
        guard("trail_log", MANAGE, session, &NoResource).await?;

        if self.store.get_trail(id).await?.is_none() {
            return Err(trail_not_found(id));
        }
        Ok(self.store.trail_log(id).await?)
    }
}

fn trail_not_found(id: TrailId) -> AppError {
    AppError::NotFound(format!("Trail with ID {id} not found."))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::LocationStore;
    use crate::db::memory::InMemoryStore;
    use crate::models::NewLocation;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use trails_core::{Email, LocationId};

    fn session(role: Role) -> AuthSession {
        AuthSession {
            email: Email::parse("ranger@example.com").unwrap(),
            role,
            established_at: Utc::now(),
        }
    }

    fn coast_path() -> TrailDetails {
        serde_json::from_value(json!({
            "TrailName": "Coast Path",
            "TrailDifficulty": "Easy",
            "TrailDistance": 5.2,
            "TrailEstTime": "2h",
            "TrailRouteType": "Loop",
            "TrailDescription": "...",
            "LocationID": 1
        }))
        .unwrap()
    }

    async fn store_with_location() -> InMemoryStore {
        let store = InMemoryStore::new();
        let location = store
            .create_location(&NewLocation {
                name: "Plymouth".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(location.id, LocationId::new(1));
        store
    }

    #[tokio::test]
    async fn test_admin_creates_trail_and_log_entry() {
        let store = store_with_location().await;
        let service = TrailService::new(&store);
        let admin = session(Role::Admin);

        let trail = service.create(Some(&admin), coast_path()).await.unwrap();
        assert_eq!(trail.details.distance, Decimal::new(52, 1));

        let log = service.log(Some(&admin), trail.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.first().unwrap().added_by, "ranger@example.com");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_mutate() {
        let store = store_with_location().await;
        let service = TrailService::new(&store);
        let trail = service
            .create(Some(&session(Role::Admin)), coast_path())
            .await
            .unwrap();

        let patch: TrailPatch = serde_json::from_value(json!({"TrailName": "Renamed"})).unwrap();
        let err = service
            .update(Some(&session(Role::User)), trail.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Denied(Denial::Forbidden)));

        let err = service.delete(None, trail.id).await.unwrap_err();
        assert!(matches!(err, AppError::Denied(Denial::Unauthorized)));

        let unchanged = service.get(None, trail.id).await.unwrap();
        assert_eq!(unchanged.details.name, "Coast Path");
    }

    #[tokio::test]
    async fn test_unknown_location_is_not_found() {
        let store = InMemoryStore::new();
        let service = TrailService::new(&store);
        let err = service
            .create(Some(&session(Role::Admin)), coast_path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Database(RepositoryError::MissingReference(_))
        ));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = store_with_location().await;
        let service = TrailService::new(&store);
        let admin = session(Role::Admin);
        let trail = service.create(Some(&admin), coast_path()).await.unwrap();

        let patch: TrailPatch =
            serde_json::from_value(json!({"TrailRating": 4.5, "TrailEstTime": "3h"})).unwrap();
        let updated = service.update(Some(&admin), trail.id, patch).await.unwrap();
        assert_eq!(updated.details.rating, Some(Decimal::new(45, 1)));
        assert_eq!(updated.details.est_time, "3h");
        assert_eq!(updated.details.name, "Coast Path");

        let err = service
            .update(Some(&admin), trail.id, TrailPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_trail() {
        let store = InMemoryStore::new();
        let service = TrailService::new(&store);
        let admin = session(Role::Admin);
        assert!(matches!(
            service.get(None, TrailId::new(9)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(Some(&admin), TrailId::new(9)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_on_unknown_trail_is_not_found() {
        let store = store_with_location().await;
        let service = TrailService::new(&store);

        let err = service
            .update(Some(&session(Role::Admin)), TrailId::new(9), TrailPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
