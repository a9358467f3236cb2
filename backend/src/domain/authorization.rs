//! Membership-scoped authorization guard.
//!
//! Every project-scoped read or write flows through [`AuthorizationGuard`]
//! before touching data. Nested resources never decide access themselves: a
//! task or comment names its owning project through [`ProjectScoped`] and the
//! guard checks the caller's membership in that project. An unknown project
//! surfaces as not-found so the guard never leaks which ids exist.

use std::sync::Arc;

use crate::domain::error::Error;
use crate::domain::ids::{ProjectId, UserId};
use crate::domain::ports::{ProjectRepository, ProjectRepositoryError};
use crate::domain::project::{MemberRole, Project};

/// An entity that lives inside exactly one project.
///
/// Access checks resolve the owning project from this capability instead of
/// inspecting the entity's shape.
pub trait ProjectScoped {
    /// The project whose membership roll governs access to this entity.
    fn owning_project(&self) -> ProjectId;
}

impl ProjectScoped for crate::domain::task::Task {
    fn owning_project(&self) -> ProjectId {
        self.project
    }
}

impl ProjectScoped for crate::domain::comment::Comment {
    fn owning_project(&self) -> ProjectId {
        self.project
    }
}

impl ProjectScoped for crate::domain::activity::ActivityEntry {
    fn owning_project(&self) -> ProjectId {
        self.project
    }
}

/// The caller's resolved standing inside a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAccess {
    pub project: Project,
    pub role: MemberRole,
}

/// Checks a user's membership before any project-scoped operation.
pub struct AuthorizationGuard {
    projects: Arc<dyn ProjectRepository>,
}

impl AuthorizationGuard {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    /// Require that `user` is a member of `project` (any role).
    ///
    /// The project owner always passes with an admin role, even if the
    /// owner's membership row has been tampered with or removed. An unknown
    /// project yields not-found; a known project without a membership row
    /// for the user yields forbidden.
    pub async fn require_member(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<ProjectAccess, Error> {
        let stored = self
            .projects
            .find(project)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| Error::not_found("project not found"))?;

        if stored.owner == user {
            return Ok(ProjectAccess {
                project: stored,
                role: MemberRole::Admin,
            });
        }

        let membership = self
            .projects
            .find_membership(project, user)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| Error::forbidden("you are not a member of this project"))?;

        Ok(ProjectAccess {
            project: stored,
            role: membership.role,
        })
    }

    /// Require that `user` holds the admin role in `project` (or owns it).
    pub async fn require_admin(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<ProjectAccess, Error> {
        let access = self.require_member(project, user).await?;
        if access.role != MemberRole::Admin {
            return Err(Error::forbidden(
                "this action requires the admin role on the project",
            ));
        }
        Ok(access)
    }

    /// Require membership in the project owning `entity`.
    pub async fn require_member_of(
        &self,
        entity: &impl ProjectScoped,
        user: UserId,
    ) -> Result<ProjectAccess, Error> {
        self.require_member(entity.owning_project(), user).await
    }
}

fn repository_error(err: ProjectRepositoryError) -> Error {
    Error::service_unavailable(err.to_string())
}
