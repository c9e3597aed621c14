//! Location operations.

use trails_core::{LocationId, Role};

use super::guard;
use crate::access::{NoResource, Policy};
use crate::db::LocationStore;
use crate::error::{AppError, Result};
use crate::models::{AuthSession, Location, NewLocation};

pub struct LocationService<'a, S> {
    store: &'a S,
}

impl<'a, S: LocationStore> LocationService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, session: Option<&AuthSession>) -> Result<Vec<Location>> {
        guard("list_locations", Policy::Public, session, &NoResource).await?;
        Ok(self.store.list_locations().await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no location has this id.
    pub async fn get(&self, session: Option<&AuthSession>, id: LocationId) -> Result<Location> {
        guard("get_location", Policy::Public, session, &NoResource).await?;
        self.store
            .get_location(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location with ID {id} not found.")))
    }

    /// # Errors
    ///
    /// Returns the `RoleGated(Admin)` denials and `Invalid` for a bad name.
    pub async fn create(
        &self,
        session: Option<&AuthSession>,
        location: NewLocation,
    ) -> Result<Location> {
        guard(
            "create_location",
            Policy::RoleGated(Role::Admin),
            session,
            &NoResource,
        )
        .await?;
        location.validate()?;

        let created = self.store.create_location(&location).await?;
        tracing::info!(location_id = %created.id, name = %created.name, "Location created");
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::access::Denial;
    use crate::db::memory::InMemoryStore;
    use chrono::Utc;
    use trails_core::Email;

    fn session(role: Role) -> AuthSession {
        AuthSession {
            email: Email::parse("ranger@example.com").unwrap(),
            role,
            established_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let store = InMemoryStore::new();
        let service = LocationService::new(&store);

        let created = service
            .create(
                Some(&session(Role::Admin)),
                NewLocation {
                    name: " Dartmoor ".to_owned(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.name, "Dartmoor");

        let fetched = service.get(None, created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(service.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let store = InMemoryStore::new();
        let service = LocationService::new(&store);
        let err = service
            .create(
                Some(&session(Role::User)),
                NewLocation {
                    name: "Exmoor".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Denied(Denial::Forbidden)));
    }
}
