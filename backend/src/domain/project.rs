//! Project aggregate and membership roll.
//!
//! A project owns tasks, comments, attachments, and an activity feed. Access
//! is governed by the membership roll: one row per (project, user) pair with
//! a role. The owner additionally holds an admin membership row created in
//! the same transaction as the project itself.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, UserId};

/// Role granted to a project member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// May change project metadata and manage the membership roll.
    Admin,
    /// May create and modify tasks and comments.
    Member,
    /// Read access; task/comment creation is permitted by current policy.
    Viewer,
}

impl MemberRole {
    /// Stable wire/storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown member role: {0}")]
pub struct ParseMemberRoleError(pub String);

impl FromStr for MemberRole {
    type Err = ParseMemberRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(ParseMemberRoleError(other.to_owned())),
        }
    }
}

/// A collaboration project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// Owning user; implicitly an admin.
    pub owner: UserId,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Construct a fresh project owned by `owner`.
    pub fn create(name: impl Into<String>, description: impl Into<String>, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::random(),
            name: name.into(),
            description: description.into(),
            owner,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A (project, user, role) grant governing visibility and mutation rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembership {
    pub project: ProjectId,
    pub user: UserId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl ProjectMembership {
    /// Construct a membership grant joined now.
    pub fn grant(project: ProjectId, user: UserId, role: MemberRole) -> Self {
        Self {
            project,
            user,
            role,
            joined_at: Utc::now(),
        }
    }
}
