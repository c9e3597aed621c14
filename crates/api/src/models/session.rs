//! Session-related types.
//!
//! Types stored in the server-side session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trails_core::{Email, Role};

use super::Identity;

/// Authenticated context bound to one client session.
///
/// The role is a snapshot taken at login. Role changes made afterwards do
/// not affect a session that is already established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Email of the identity that logged in.
    pub email: Email,
    /// Role as read from the user directory at login time.
    pub role: Role,
    /// When the login succeeded.
    pub established_at: DateTime<Utc>,
}

impl AuthSession {
    /// Snapshot an identity at the given instant.
    #[must_use]
    pub fn snapshot(identity: &Identity, established_at: DateTime<Utc>) -> Self {
        Self {
            email: identity.email.clone(),
            role: identity.role,
            established_at,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current [`AuthSession`](super::AuthSession).
    pub const AUTH_SESSION: &str = "auth_session";
}
