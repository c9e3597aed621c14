//! Comment operations and their ownership rules.
//!
//! Editing is open to the author and to admins. Archiving is admin-only, so
//! authors cannot archive their own comments. Both look the comment up
//! before authorizing, so an unknown id reports `NotFound` whatever the
//! session.

use trails_core::{CommentId, Role, TrailId};

use super::guard;
use crate::access::{AccessError, AuthoredBy, Denial, NoResource, Policy};
use crate::db::{CommentStore, RepositoryError, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{AuthSession, Comment, CommentPatch, NewComment};

const EDIT: Policy = Policy::OwnerOrRole(Role::Admin);
const ARCHIVE: Policy = Policy::RoleGated(Role::Admin);

/// Comment service.
pub struct CommentService<'a, C, D> {
    comments: &'a C,
    directory: &'a D,
}

impl<'a, C, D> CommentService<'a, C, D>
where
    C: CommentStore,
    D: UserDirectory,
{
    #[must_use]
    pub const fn new(comments: &'a C, directory: &'a D) -> Self {
        Self {
            comments,
            directory,
        }
    }

    /// All non-archived comments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, session: Option<&AuthSession>) -> Result<Vec<Comment>> {
        guard("list_comments", Policy::Public, session, &NoResource).await?;
        Ok(self.comments.list_comments().await?)
    }

    /// Non-archived comments on one trail. An unknown trail has none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list_for_trail(
        &self,
        session: Option<&AuthSession>,
        trail_id: TrailId,
    ) -> Result<Vec<Comment>> {
        guard("list_trail_comments", Policy::Public, session, &NoResource).await?;
        Ok(self.comments.list_comments_for_trail(trail_id).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown and archived comments.
    pub async fn get(&self, session: Option<&AuthSession>, id: CommentId) -> Result<Comment> {
        guard("get_comment", Policy::Public, session, &NoResource).await?;
        self.visible(id).await
    }

    /// Post a comment as the session identity.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `NotFound` for an unknown
    /// trail, and an internal error if the session identity is missing from
    /// the directory.
    pub async fn create(
        &self,
        session: Option<&AuthSession>,
        trail_id: TrailId,
        body: NewComment,
    ) -> Result<Comment> {
        guard("create_comment", Policy::Authenticated, session, &NoResource).await?;
        let actor = session.ok_or(Denial::Unauthorized)?;

        body.validate()?;

        let author = self
            .directory
            .find_by_email(&actor.email)
            .await?
            .ok_or_else(|| AccessError::SessionIdentityMissing(actor.email.clone()))?;

        let comment = self
            .comments
            .create_comment(trail_id, author.id, &body.text)
            .await
            .map_err(|e| match e {
                RepositoryError::MissingReference(_) => {
                    AppError::NotFound(format!("Trail with ID {trail_id} not found."))
                }
                other => other.into(),
            })?;

        tracing::info!(
            comment_id = %comment.id,
            trail_id = %trail_id,
            author_id = %author.id,
            "Comment created"
        );
        Ok(comment)
    }

    /// Replace the text of a comment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or archived comments, then the
    /// `OwnerOrRole(Admin)` denials.
    pub async fn edit(
        &self,
        session: Option<&AuthSession>,
        id: CommentId,
        patch: CommentPatch,
    ) -> Result<Comment> {
        let comment = self.visible(id).await?;

        let lookup = AuthoredBy::new(self.directory, Some(comment.author_id));
        guard("edit_comment", EDIT, session, &lookup).await?;

        patch.validate()?;

        let updated = self
            .comments
            .update_comment_text(id, &patch.text)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => comment_not_found(id),
                other => other.into(),
            })?;

        tracing::info!(comment_id = %id, "Comment edited");
        Ok(updated)
    }

    /// Archive a comment. Archiving an archived comment succeeds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown comments, then the `RoleGated(Admin)`
    /// denials.
    pub async fn archive(&self, session: Option<&AuthSession>, id: CommentId) -> Result<()> {
        if self.comments.get_comment(id).await?.is_none() {
            return Err(comment_not_found(id));
        }

        guard("archive_comment", ARCHIVE, session, &NoResource).await?;

        self.comments
            .archive_comment(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => comment_not_found(id),
                other => other.into(),
            })?;

        tracing::info!(comment_id = %id, "Comment archived");
        Ok(())
    }

    async fn visible(&self, id: CommentId) -> Result<Comment> {
        self.comments
            .get_comment(id)
            .await?
            .filter(|c| !c.archived)
            .ok_or_else(|| comment_not_found(id))
    }
}

fn comment_not_found(id: CommentId) -> AppError {
    AppError::NotFound(format!("Comment with ID {id} not found."))
}
