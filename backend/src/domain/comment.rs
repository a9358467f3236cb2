//! Threaded comments on projects and tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, ProjectId, TaskId, UserId};

/// A comment attached to a project, optionally scoped to one of its tasks,
/// optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub project: ProjectId,
    /// Present for task-level comments, absent for project-level ones.
    pub task: Option<TaskId>,
    pub author: UserId,
    /// Parent comment for threaded replies.
    pub parent: Option<CommentId>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
