//! Authorization engine.
//!
//! Every operation declares a [`Policy`] and calls [`authorize`] before it
//! touches a repository. The engine never mutates anything. Expected denials
//! come back as [`Decision::Deny`], and integrity faults travel on the error
//! channel as [`AccessError`].
//!
//! Evaluation order:
//!
//! 1. `Public` permits unconditionally.
//! 2. Without a session every other policy denies with `Unauthorized`.
//! 3. `RoleGated(r)` permits iff the session role is `r`.
//! 4. `Authenticated` permits.
//! 5. `OwnerOrRole(r)` resolves the target owner first (absent target denies
//!    with `NotFound`), then permits the owner or any session with role `r`.

mod ownership;

use std::future::Future;

use thiserror::Error;

use trails_core::{Email, Role};

use crate::db::RepositoryError;
use crate::models::AuthSession;

pub use ownership::AuthoredBy;

/// Access requirement attached to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Anyone, with or without a session.
    Public,
    /// Any established session.
    Authenticated,
    /// Sessions whose role snapshot equals the given role.
    RoleGated(Role),
    /// The target's owner, or sessions with the given role.
    OwnerOrRole(Role),
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("Unauthorized: Please log in.")]
    Unauthorized,
    #[error("Forbidden: You do not have permission to access this resource.")]
    Forbidden,
    #[error("Resource not found.")]
    NotFound,
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    Permit,
    Deny(Denial),
}

impl Decision {
    #[must_use]
    pub const fn is_permit(self) -> bool {
        matches!(self, Self::Permit)
    }

    /// Turn a denial into an `Err` so callers can use `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`Denial`] carried by `Deny`.
    pub const fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Permit => Ok(()),
            Self::Deny(denial) => Err(denial),
        }
    }
}

/// Faults that are not access decisions.
#[derive(Debug, Error)]
pub enum AccessError {
    /// A session exists for an email the user directory does not know.
    #[error("session identity {0} is missing from the user directory")]
    SessionIdentityMissing(Email),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Relation between the session identity and the target resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The target does not exist.
    Missing,
    Owner,
    NotOwner,
}

/// Resolves ownership of the target of an `OwnerOrRole` operation.
pub trait OwnerLookup: Sync {
    /// Compare the target's owner with the session identity.
    fn resolve(
        &self,
        session: &AuthSession,
    ) -> impl Future<Output = Result<Ownership, AccessError>> + Send;
}

/// Lookup for operations whose policy never consults ownership.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResource;

impl OwnerLookup for NoResource {
    async fn resolve(&self, _session: &AuthSession) -> Result<Ownership, AccessError> {
        Ok(Ownership::Missing)
    }
}

/// Decide whether `session` may perform an operation guarded by `policy`.
///
/// # Errors
///
/// Returns `AccessError` when ownership resolution fails. Denials are
/// returned as `Ok(Decision::Deny(..))`.
pub async fn authorize<L: OwnerLookup>(
    policy: Policy,
    session: Option<&AuthSession>,
    lookup: &L,
) -> Result<Decision, AccessError> {
    if policy == Policy::Public {
        return Ok(Decision::Permit);
    }

    let Some(session) = session else {
        return Ok(Decision::Deny(Denial::Unauthorized));
    };

    let decision = match policy {
        Policy::Public | Policy::Authenticated => Decision::Permit,
        Policy::RoleGated(role) => {
            if session.role == role {
                Decision::Permit
            } else {
                Decision::Deny(Denial::Forbidden)
            }
        }
        // The session identity is resolved even for privileged roles so a
        // dangling session is always reported.
        Policy::OwnerOrRole(role) => match lookup.resolve(session).await? {
            Ownership::Missing => Decision::Deny(Denial::NotFound),
            Ownership::Owner => Decision::Permit,
            Ownership::NotOwner if session.role == role => Decision::Permit,
            Ownership::NotOwner => Decision::Deny(Denial::Forbidden),
        },
    };

    Ok(decision)
}
