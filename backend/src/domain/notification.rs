//! Per-user notifications.
//!
//! Notification rows are only ever created by the side-effect pipeline as a
//! consequence of another entity's mutation; clients can read them and flip
//! `is_read`, nothing else.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, NotificationId, ProjectId, TaskId, UserId};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskUpdated,
    CommentAdded,
    DeadlineSoon,
    ProjectInvite,
}

impl NotificationKind {
    /// Stable wire/storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskUpdated => "task_updated",
            Self::CommentAdded => "comment_added",
            Self::DeadlineSoon => "deadline_soon",
            Self::ProjectInvite => "project_invite",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown notification kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification kind: {0}")]
pub struct ParseNotificationKindError(pub String);

impl FromStr for NotificationKind {
    type Err = ParseNotificationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task_assigned" => Ok(Self::TaskAssigned),
            "task_updated" => Ok(Self::TaskUpdated),
            "comment_added" => Ok(Self::CommentAdded),
            "deadline_soon" => Ok(Self::DeadlineSoon),
            "project_invite" => Ok(Self::ProjectInvite),
            other => Err(ParseNotificationKindError(other.to_owned())),
        }
    }
}

/// A notification delivered to one user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    /// Recipient.
    pub user: UserId,
    pub kind: NotificationKind,
    pub project: Option<ProjectId>,
    pub task: Option<TaskId>,
    pub comment: Option<CommentId>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification payload produced by the side-effect pipeline, before the
/// store assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user: UserId,
    pub kind: NotificationKind,
    pub project: Option<ProjectId>,
    pub task: Option<TaskId>,
    pub comment: Option<CommentId>,
    pub message: String,
}
