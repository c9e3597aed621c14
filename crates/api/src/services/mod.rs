//! Business logic services.
//!
//! Every operation starts with an explicit [`guard`] call naming its policy,
//! then talks to the stores it was built with.

pub mod auth;
pub mod comments;
pub mod locations;
pub mod trails;

pub use comments::CommentService;
pub use locations::LocationService;
pub use trails::TrailService;

use crate::access::{Decision, OwnerLookup, Policy, authorize};
use crate::error::AppError;
use crate::models::AuthSession;

/// Evaluate `policy` and turn a denial into an error.
///
/// # Errors
///
/// Returns `AppError::Denied` on denial and `AppError::Access` when the
/// decision could not be made.
pub async fn guard<L: OwnerLookup>(
    operation: &'static str,
    policy: Policy,
    session: Option<&AuthSession>,
    lookup: &L,
) -> Result<(), AppError> {
    match authorize(policy, session, lookup).await? {
        Decision::Permit => Ok(()),
        Decision::Deny(denial) => {
            tracing::info!(
                operation,
                ?policy,
                ?denial,
                email = session.map(|s| s.email.as_str()),
                role = session.map(|s| s.role.as_str()),
                "Access denied"
            );
            Err(denial.into())
        }
    }
}
