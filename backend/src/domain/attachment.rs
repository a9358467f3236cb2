//! File attachment records.
//!
//! The binary payload lives in external storage; the domain only keeps a
//! path reference plus the owning entity. Exactly one owner must be set,
//! which the [`AttachmentOwner`] enum makes unrepresentable to violate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AttachmentId, CommentId, ProjectId, TaskId, UserId};

/// The single entity an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum AttachmentOwner {
    Project(ProjectId),
    Task(TaskId),
    Comment(CommentId),
}

/// A stored file reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    /// Path or key inside the external file store.
    pub file_path: String,
    pub uploaded_by: UserId,
    pub owner: AttachmentOwner,
    pub created_at: DateTime<Utc>,
}
