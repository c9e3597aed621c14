//! Local user directory records.

use serde::Serialize;

use trails_core::{Email, Role, UserId};

/// A locally known user, keyed by email.
///
/// Identities are never deleted by the API. The role changes only through
/// the CLI, and a change is picked up at the user's next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(rename = "UserID")]
    pub id: UserId,
    #[serde(rename = "EmailAddress")]
    pub email: Email,
    #[serde(rename = "Role")]
    pub role: Role,
}
