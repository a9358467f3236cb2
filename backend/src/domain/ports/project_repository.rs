//! Port for project and membership persistence.

use async_trait::async_trait;

use crate::domain::ids::{ProjectId, UserId};
use crate::domain::project::{Project, ProjectMembership};
use crate::domain::side_effects::SideEffects;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by project repository adapters.
    pub enum ProjectRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "project repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "project repository query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Conflict { message: String } =>
            "project repository conflict: {message}",
    }
}

/// Persistence for projects and their membership roll.
///
/// Mutating operations that carry a [`SideEffects`] argument must persist the
/// primary row and every derived row in one transaction; a failure on either
/// side rolls back both.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persist a new project, the owner's admin membership, and the derived
    /// side-effect rows atomically. Neither the project nor the membership
    /// may exist without the other.
    async fn create(
        &self,
        project: &Project,
        owner_membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<(), ProjectRepositoryError>;

    /// Fetch a project by id.
    async fn find(&self, id: ProjectId) -> Result<Option<Project>, ProjectRepositoryError>;

    /// List the projects the user owns or is a member of, newest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Project>, ProjectRepositoryError>;

    /// Replace a project row with the given state.
    async fn update(&self, project: &Project) -> Result<(), ProjectRepositoryError>;

    /// Delete a project; owned tasks, comments, memberships, and feeds
    /// cascade.
    async fn delete(&self, id: ProjectId) -> Result<(), ProjectRepositoryError>;

    /// Fetch the membership row for a (project, user) pair.
    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<ProjectMembership>, ProjectRepositoryError>;

    /// List the full membership roll of a project.
    async fn list_members(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMembership>, ProjectRepositoryError>;

    /// Insert the membership or, when the (project, user) pair already
    /// exists, update its role in place (last write wins). The check and
    /// insert are a single atomic step backed by the unique pair constraint.
    /// Derived side-effect rows are persisted in the same transaction.
    async fn upsert_membership(
        &self,
        membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<ProjectMembership, ProjectRepositoryError>;
}
