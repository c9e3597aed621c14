//! In-memory implementation of every store trait.
//!
//! Backs unit and integration tests. Everything is lost when the last clone
//! is dropped. Sequences start at 1 like `SERIAL` columns, and
//! [`InMemoryStore::insert_comment`] lets tests place rows with fixed ids.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use trails_core::{CommentId, Email, LocationId, Role, TrailId, TrailLogId, UserId};

use super::{CommentStore, LocationStore, RepositoryError, TrailStore, UserDirectory};
use crate::models::{
    Comment, Identity, Location, NewLocation, Trail, TrailDetails, TrailLogEntry,
};

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, Identity>,
    locations: BTreeMap<LocationId, Location>,
    trails: BTreeMap<TrailId, Trail>,
    comments: BTreeMap<CommentId, Comment>,
    trail_log: Vec<TrailLogEntry>,
    next_id: i32,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Keep generated ids above any id a test placed explicitly.
    fn reserve(&mut self, id: i32) {
        self.next_id = self.next_id.max(id);
    }

    fn user_by_email(&self, email: &Email) -> Option<&Identity> {
        self.users.values().find(|user| &user.email == email)
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity with a fixed id.
    ///
    /// # Panics
    ///
    /// Panics if the id or email is already taken.
    pub fn insert_user(&self, id: UserId, email: &Email, role: Role) -> Identity {
        let mut inner = self.inner.write();
        assert!(!inner.users.contains_key(&id), "user id {id} already taken");
        assert!(inner.user_by_email(email).is_none(), "email {email} already taken");
        let identity = Identity {
            id,
            email: email.clone(),
            role,
        };
        inner.reserve(id.as_i32());
        inner.users.insert(id, identity.clone());
        identity
    }

    /// Place a comment with a fixed id, bypassing foreign key checks.
    pub fn insert_comment(&self, id: CommentId, trail_id: TrailId, author_id: UserId, text: &str) {
        let comment = Comment {
            id,
            trail_id,
            author_id,
            text: text.to_owned(),
            created_at: Utc::now(),
            archived: false,
        };
        let mut inner = self.inner.write();
        inner.reserve(id.as_i32());
        inner.comments.insert(id, comment);
    }

    /// Stored comment including archived ones.
    #[must_use]
    pub fn comment(&self, id: CommentId) -> Option<Comment> {
        self.inner.read().comments.get(&id).cloned()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }
}

impl UserDirectory for InMemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.inner.read().user_by_email(email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_or_create(&self, email: &Email) -> Result<Identity, RepositoryError> {
        // Lookup and insert under one write lock.
        let mut inner = self.inner.write();
        if let Some(existing) = inner.user_by_email(email) {
            return Ok(existing.clone());
        }
        let id = UserId::new(inner.next_id());
        let identity = Identity {
            id,
            email: email.clone(),
            role: Role::User,
        };
        inner.users.insert(id, identity.clone());
        Ok(identity)
    }

    async fn create_user(&self, email: &Email, role: Role) -> Result<Identity, RepositoryError> {
        let mut inner = self.inner.write();
        if inner.user_by_email(email).is_some() {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let id = UserId::new(inner.next_id());
        let identity = Identity {
            id,
            email: email.clone(),
            role,
        };
        inner.users.insert(id, identity.clone());
        Ok(identity)
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<Identity, RepositoryError> {
        let mut inner = self.inner.write();
        let identity = inner
            .users
            .values_mut()
            .find(|user| &user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        identity.role = role;
        Ok(identity.clone())
    }
}

impl TrailStore for InMemoryStore {
    async fn list_trails(&self) -> Result<Vec<Trail>, RepositoryError> {
        Ok(self.inner.read().trails.values().cloned().collect())
    }

    async fn get_trail(&self, id: TrailId) -> Result<Option<Trail>, RepositoryError> {
        Ok(self.inner.read().trails.get(&id).cloned())
    }

    async fn create_trail(
        &self,
        details: &TrailDetails,
        added_by: &Email,
    ) -> Result<Trail, RepositoryError> {
        let mut inner = self.inner.write();
        if !inner.locations.contains_key(&details.location_id) {
            return Err(RepositoryError::MissingReference(
                "location does not exist".to_owned(),
            ));
        }
        let trail = Trail {
            id: TrailId::new(inner.next_id()),
            details: details.clone(),
        };
        inner.trails.insert(trail.id, trail.clone());

        let log_id = TrailLogId::new(inner.next_id());
        inner.trail_log.push(TrailLogEntry {
            id: log_id,
            trail_id: trail.id,
            added_by: added_by.to_string(),
            added_on: Utc::now(),
        });
        Ok(trail)
    }

    async fn update_trail(
        &self,
        id: TrailId,
        details: &TrailDetails,
    ) -> Result<Trail, RepositoryError> {
        let mut inner = self.inner.write();
        if !inner.locations.contains_key(&details.location_id) {
            return Err(RepositoryError::MissingReference(
                "location does not exist".to_owned(),
            ));
        }
        let trail = inner.trails.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        trail.details = details.clone();
        Ok(trail.clone())
    }

    async fn delete_trail(&self, id: TrailId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write();
        if !inner.trails.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if inner.comments.values().any(|c| c.trail_id == id) {
            return Err(RepositoryError::Conflict("trail still has comments".to_owned()));
        }
        inner.trails.remove(&id);
        inner.trail_log.retain(|entry| entry.trail_id != id);
        Ok(())
    }

    async fn trail_log(&self, id: TrailId) -> Result<Vec<TrailLogEntry>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .trail_log
            .iter()
            .filter(|entry| entry.trail_id == id)
            .cloned()
            .collect())
    }
}

impl CommentStore for InMemoryStore {
    async fn list_comments(&self) -> Result<Vec<Comment>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .comments
            .values()
            .filter(|c| !c.archived)
            .cloned()
            .collect())
    }

    async fn list_comments_for_trail(
        &self,
        trail_id: TrailId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .comments
            .values()
            .filter(|c| c.trail_id == trail_id && !c.archived)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.inner.read().comments.get(&id).cloned())
    }

    async fn create_comment(
        &self,
        trail_id: TrailId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment, RepositoryError> {
        let mut inner = self.inner.write();
        if !inner.trails.contains_key(&trail_id) || !inner.users.contains_key(&author_id) {
            return Err(RepositoryError::MissingReference(
                "trail or author does not exist".to_owned(),
            ));
        }
        let comment = Comment {
            id: CommentId::new(inner.next_id()),
            trail_id,
            author_id,
            text: text.to_owned(),
            created_at: Utc::now(),
            archived: false,
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_comment_text(
        &self,
        id: CommentId,
        text: &str,
    ) -> Result<Comment, RepositoryError> {
        let mut inner = self.inner.write();
        let comment = inner
            .comments
            .get_mut(&id)
            .filter(|c| !c.archived)
            .ok_or(RepositoryError::NotFound)?;
        text.clone_into(&mut comment.text);
        Ok(comment.clone())
    }

    async fn archive_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write();
        let comment = inner.comments.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        comment.archived = true;
        Ok(())
    }
}

impl LocationStore for InMemoryStore {
    async fn list_locations(&self) -> Result<Vec<Location>, RepositoryError> {
        Ok(self.inner.read().locations.values().cloned().collect())
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, RepositoryError> {
        Ok(self.inner.read().locations.get(&id).cloned())
    }

    async fn create_location(&self, location: &NewLocation) -> Result<Location, RepositoryError> {
        let mut inner = self.inner.write();
        let location = Location {
            id: LocationId::new(inner.next_id()),
            name: location.name.trim().to_owned(),
        };
        inner.locations.insert(location.id, location.clone());
        Ok(location)
    }
}
