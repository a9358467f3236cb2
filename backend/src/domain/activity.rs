//! Per-project activity log.
//!
//! Activity rows are append-only and only ever created by the side-effect
//! pipeline. The `meta` field is an open JSON object carrying a short
//! denormalised snapshot of the mutated entity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{ActivityId, ProjectId, UserId};

/// Entity category an activity entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTarget {
    Project,
    Task,
    Comment,
}

impl ActivityTarget {
    /// Stable wire/storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for ActivityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown activity target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity target: {0}")]
pub struct ParseActivityTargetError(pub String);

impl FromStr for ActivityTarget {
    type Err = ParseActivityTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "task" => Ok(Self::Task),
            "comment" => Ok(Self::Comment),
            other => Err(ParseActivityTargetError(other.to_owned())),
        }
    }
}

/// One row of a project's audit feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub project: ProjectId,
    /// Acting user; null when the actor has since been deleted.
    pub actor: Option<UserId>,
    /// Short free-form verb such as `created` or `added_member`.
    pub verb: String,
    pub target: ActivityTarget,
    pub target_id: Uuid,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Activity payload produced by the side-effect pipeline, before the store
/// assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityEntry {
    pub project: ProjectId,
    pub actor: UserId,
    pub verb: String,
    pub target: ActivityTarget,
    pub target_id: Uuid,
    pub meta: serde_json::Value,
}
