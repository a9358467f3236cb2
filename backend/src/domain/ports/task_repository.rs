//! Port for task persistence, watchers, and the workload aggregate.

use async_trait::async_trait;

use crate::domain::ids::{ProjectId, TaskId, UserId};
use crate::domain::side_effects::SideEffects;
use crate::domain::task::{Task, TaskStatus, TaskStatusChange, WorkloadEntry};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by task repository adapters.
    pub enum TaskRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "task repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "task repository query failed: {message}",
    }
}

/// Filter for task listings. `project` is mandatory at this level; the
/// service layer already maps an unscoped request to an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub project: ProjectId,
    pub status: Option<TaskStatus>,
}

/// Persistence for tasks.
///
/// Mutating operations that carry a [`SideEffects`] argument must persist the
/// primary row and every derived row in one transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task and its derived rows atomically.
    async fn create(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError>;

    /// Fetch a task by id.
    async fn find(&self, id: TaskId) -> Result<Option<Task>, TaskRepositoryError>;

    /// List tasks matching the filter, ordered by rank ascending, ties by
    /// creation time descending.
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, TaskRepositoryError>;

    /// Replace a task row with the given state and persist the derived rows
    /// atomically.
    async fn update(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError>;

    /// Delete a task; watchers, history, and task comments cascade.
    async fn delete(&self, id: TaskId) -> Result<(), TaskRepositoryError>;

    /// Record the user as a watcher of the task. Idempotent: watching a task
    /// twice leaves a single row.
    async fn add_watcher(&self, task: TaskId, user: UserId) -> Result<(), TaskRepositoryError>;

    /// Status transition history of a task, oldest first.
    async fn status_history(
        &self,
        task: TaskId,
    ) -> Result<Vec<TaskStatusChange>, TaskRepositoryError>;

    /// Open-task counts per assignee for a project. Tasks without an
    /// assignee are excluded entirely; only open statuses count.
    async fn workload(
        &self,
        project: ProjectId,
    ) -> Result<Vec<WorkloadEntry>, TaskRepositoryError>;
}
