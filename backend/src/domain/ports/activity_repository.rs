//! Port for the per-project activity feed.

use async_trait::async_trait;

use crate::domain::activity::ActivityEntry;
use crate::domain::ids::ProjectId;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by activity repository adapters.
    pub enum ActivityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "activity repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "activity repository query failed: {message}",
    }
}

/// Read surface over the append-only activity log.
///
/// Rows are inserted exclusively by the side-effect pipeline through the
/// other repositories' composite writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// List a project's activity entries, newest first.
    async fn list_for_project(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ActivityEntry>, ActivityRepositoryError>;
}
