//! Ownership resolution against the user directory.

use trails_core::UserId;

use super::{AccessError, OwnerLookup, Ownership};
use crate::db::UserDirectory;
use crate::models::AuthSession;

/// Owner lookup for a resource authored by a local identity.
///
/// `author` is `None` when the target does not exist. The session's email is
/// resolved to a numeric id and compared with the author id.
pub struct AuthoredBy<'a, D> {
    directory: &'a D,
    author: Option<UserId>,
}

impl<'a, D: UserDirectory> AuthoredBy<'a, D> {
    #[must_use]
    pub const fn new(directory: &'a D, author: Option<UserId>) -> Self {
        Self { directory, author }
    }
}

impl<D: UserDirectory> OwnerLookup for AuthoredBy<'_, D> {
    async fn resolve(&self, session: &AuthSession) -> Result<Ownership, AccessError> {
        let Some(author) = self.author else {
            return Ok(Ownership::Missing);
        };

        let identity = self
            .directory
            .find_by_email(&session.email)
            .await?
            .ok_or_else(|| AccessError::SessionIdentityMissing(session.email.clone()))?;

        Ok(if identity.id == author {
            Ownership::Owner
        } else {
            Ownership::NotOwner
        })
    }
}
