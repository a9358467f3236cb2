//! Project lifecycle and membership management.

use std::sync::Arc;

use chrono::Utc;

use super::authorization::AuthorizationGuard;
use super::error::Error;
use super::ids::{ProjectId, UserId};
use super::ports::{ProjectRepository, ProjectRepositoryError, UserRepository};
use super::project::{MemberRole, Project, ProjectMembership};
use super::side_effects;

/// Partial update to a project; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_archived: Option<bool>,
}

/// Application service for projects and their membership roll.
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
    guard: Arc<AuthorizationGuard>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
        guard: Arc<AuthorizationGuard>,
    ) -> Self {
        Self {
            projects,
            users,
            guard,
        }
    }

    /// Create a project owned by `actor`.
    ///
    /// The owner's admin membership and the `created` audit entry are
    /// persisted in the same transaction as the project row.
    pub async fn create(
        &self,
        actor: UserId,
        name: &str,
        description: &str,
    ) -> Result<Project, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_request("project name must not be empty"));
        }

        let project = Project::create(name, description, actor);
        let membership = ProjectMembership::grant(project.id, actor, MemberRole::Admin);
        let effects = side_effects::project_created(&project);
        self.projects
            .create(&project, &membership, &effects)
            .await
            .map_err(repository_error)?;
        Ok(project)
    }

    /// List the projects visible to `actor`, newest first.
    pub async fn list(&self, actor: UserId) -> Result<Vec<Project>, Error> {
        self.projects
            .list_for_user(actor)
            .await
            .map_err(repository_error)
    }

    /// Fetch one project the actor is a member of.
    pub async fn get(&self, actor: UserId, id: ProjectId) -> Result<Project, Error> {
        Ok(self.guard.require_member(id, actor).await?.project)
    }

    /// Apply a partial update. Requires the admin role.
    pub async fn update(
        &self,
        actor: UserId,
        id: ProjectId,
        changes: ProjectChanges,
    ) -> Result<Project, Error> {
        let mut project = self.guard.require_admin(id, actor).await?.project;

        if let Some(name) = changes.name {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(Error::invalid_request("project name must not be empty"));
            }
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(is_archived) = changes.is_archived {
            project.is_archived = is_archived;
        }
        project.updated_at = Utc::now();

        self.projects
            .update(&project)
            .await
            .map_err(repository_error)?;
        Ok(project)
    }

    /// Delete a project and everything it owns. Requires the admin role.
    pub async fn delete(&self, actor: UserId, id: ProjectId) -> Result<(), Error> {
        self.guard.require_admin(id, actor).await?;
        self.projects.delete(id).await.map_err(repository_error)
    }

    /// Add `user` to the project's roll, or change their role if already on
    /// it (last write wins). Requires the admin role.
    ///
    /// The invite notification and `added_member` audit entry are derived on
    /// every call; re-adding an existing member notifies them again.
    pub async fn add_member(
        &self,
        actor: UserId,
        project_id: ProjectId,
        user: UserId,
        role: MemberRole,
    ) -> Result<ProjectMembership, Error> {
        let access = self.guard.require_admin(project_id, actor).await?;

        self.users
            .find(user)
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let membership = ProjectMembership::grant(project_id, user, role);
        let effects = side_effects::member_added(&access.project, user, role, actor);
        self.projects
            .upsert_membership(&membership, &effects)
            .await
            .map_err(repository_error)
    }

    /// List the membership roll. Any member may read it.
    pub async fn members(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectMembership>, Error> {
        self.guard.require_member(project_id, actor).await?;
        self.projects
            .list_members(project_id)
            .await
            .map_err(repository_error)
    }
}

fn repository_error(err: ProjectRepositoryError) -> Error {
    match &err {
        ProjectRepositoryError::Conflict { .. } => Error::conflict(err.to_string()),
        ProjectRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        ProjectRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}
