//! Trail comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trails_core::{CommentId, TrailId, UserId};

use super::{InvalidField, require_text};

/// Maximum length of a comment body.
pub const MAX_COMMENT_TEXT: usize = 4000;

/// A comment left on a trail.
///
/// `archived` only ever moves from `false` to `true`. Archived comments stay
/// in storage but are never returned by read operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    #[serde(rename = "CommentID")]
    pub id: CommentId,
    #[serde(rename = "TrailID")]
    pub trail_id: TrailId,
    #[serde(rename = "UserID")]
    pub author_id: UserId,
    #[serde(rename = "CommentText")]
    pub text: String,
    #[serde(rename = "CommentDate")]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub archived: bool,
}

/// Body of `POST /trails/{id}/comments`. The author and trail come from the
/// session and the path.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    #[serde(rename = "CommentText")]
    pub text: String,
}

/// Body of `PUT /comments/{id}`. Only the text is mutable.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentPatch {
    #[serde(rename = "CommentText")]
    pub text: String,
}

impl NewComment {
    /// # Errors
    ///
    /// Returns `InvalidField` if the text is blank or too long.
    pub fn validate(&self) -> Result<(), InvalidField> {
        require_text("CommentText", &self.text, MAX_COMMENT_TEXT)
    }
}

impl CommentPatch {
    /// # Errors
    ///
    /// Returns `InvalidField` if the text is blank or too long.
    pub fn validate(&self) -> Result<(), InvalidField> {
        require_text("CommentText", &self.text, MAX_COMMENT_TEXT)
    }
}
