//! Port for the per-user notification inbox.

use async_trait::async_trait;

use crate::domain::ids::UserId;
use crate::domain::notification::Notification;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Read/acknowledge surface over notifications.
///
/// Rows are inserted exclusively by the side-effect pipeline through the
/// other repositories' composite writes; this port never creates them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// List a user's notifications, newest first. An empty inbox is a valid
    /// empty list, not an error.
    async fn list_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Flip every unread notification of the user to read in one bulk
    /// update. Returns the number of rows changed; repeating the call is a
    /// no-op returning zero.
    async fn mark_all_read(&self, user: UserId) -> Result<u64, NotificationRepositoryError>;
}
