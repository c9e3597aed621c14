//! Domain models for the Trails API.
//!
//! Request bodies are separate types from the records they create so that
//! each entity has an explicit whitelist of client-writable fields. Unknown
//! fields (including primary keys) are rejected at deserialization time.

pub mod comment;
pub mod identity;
pub mod location;
pub mod session;
pub mod trail;

pub use comment::{Comment, CommentPatch, NewComment};
pub use identity::Identity;
pub use location::{Location, NewLocation};
pub use session::{AuthSession, keys as session_keys};
pub use trail::{Trail, TrailDetails, TrailLogEntry, TrailPatch};

use thiserror::Error;

/// A request body field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct InvalidField {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

impl InvalidField {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check that a text field is non-blank and fits its column.
fn require_text(field: &'static str, value: &str, max_chars: usize) -> Result<(), InvalidField> {
    if value.trim().is_empty() {
        return Err(InvalidField::new(field, "cannot be empty"));
    }
    if value.chars().count() > max_chars {
        return Err(InvalidField::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(())
}
