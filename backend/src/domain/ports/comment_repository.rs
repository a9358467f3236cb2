//! Port for comment persistence.

use async_trait::async_trait;

use crate::domain::comment::Comment;
use crate::domain::ids::{CommentId, ProjectId, TaskId};
use crate::domain::side_effects::SideEffects;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "comment repository query failed: {message}",
    }
}

/// Filter for comment listings; `project` is mandatory at this level,
/// `task` optionally narrows to one task's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentFilter {
    pub project: ProjectId,
    pub task: Option<TaskId>,
}

/// Persistence for threaded comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Persist a new comment and its derived rows atomically.
    async fn create(
        &self,
        comment: &Comment,
        effects: &SideEffects,
    ) -> Result<(), CommentRepositoryError>;

    /// Fetch a comment by id.
    async fn find(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError>;

    /// List comments matching the filter, newest first.
    async fn list(&self, filter: CommentFilter) -> Result<Vec<Comment>, CommentRepositoryError>;

    /// Delete a comment; replies cascade.
    async fn delete(&self, id: CommentId) -> Result<(), CommentRepositoryError>;
}
