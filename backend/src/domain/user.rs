//! User identity data model.
//!
//! Users are referenced by id throughout the domain and never embedded in
//! other aggregates. Registration and credential handling live in an external
//! identity service; this type only carries the profile fields the
//! collaboration core needs for display and notification text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier supplied by the identity service.
    pub id: UserId,
    /// Unique login handle.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Full display name; may be empty for fresh accounts.
    pub full_name: String,
    /// Reference to an externally stored avatar image, if any.
    pub avatar_url: Option<String>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name suitable for rendering in notification messages.
    ///
    /// Falls back to the username when no full name has been set.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}
