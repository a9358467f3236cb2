//! Attachment metadata scoped to projects, tasks, and comments.

use std::sync::Arc;

use chrono::Utc;

use super::attachment::{Attachment, AttachmentOwner};
use super::authorization::AuthorizationGuard;
use super::error::Error;
use super::ids::{AttachmentId, ProjectId, UserId};
use super::ports::{
    AttachmentRepository, AttachmentRepositoryError, CommentRepository, CommentRepositoryError,
    TaskRepository, TaskRepositoryError,
};

/// Application service for attachment records.
pub struct AttachmentService {
    attachments: Arc<dyn AttachmentRepository>,
    tasks: Arc<dyn TaskRepository>,
    comments: Arc<dyn CommentRepository>,
    guard: Arc<AuthorizationGuard>,
}

impl AttachmentService {
    pub fn new(
        attachments: Arc<dyn AttachmentRepository>,
        tasks: Arc<dyn TaskRepository>,
        comments: Arc<dyn CommentRepository>,
        guard: Arc<AuthorizationGuard>,
    ) -> Self {
        Self {
            attachments,
            tasks,
            comments,
            guard,
        }
    }

    /// Record an uploaded file against its owning entity.
    pub async fn create(
        &self,
        actor: UserId,
        owner: AttachmentOwner,
        file_path: &str,
    ) -> Result<Attachment, Error> {
        let file_path = file_path.trim();
        if file_path.is_empty() {
            return Err(Error::invalid_request("file path must not be empty"));
        }
        let project = self.resolve_project(owner).await?;
        self.guard.require_member(project, actor).await?;

        let attachment = Attachment {
            id: AttachmentId::random(),
            file_path: file_path.to_owned(),
            uploaded_by: actor,
            owner,
            created_at: Utc::now(),
        };
        self.attachments
            .create(&attachment)
            .await
            .map_err(repository_error)?;
        Ok(attachment)
    }

    /// List the attachments of one entity, newest first.
    pub async fn list(
        &self,
        actor: UserId,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, Error> {
        let project = self.resolve_project(owner).await?;
        self.guard.require_member(project, actor).await?;
        self.attachments
            .list_for_owner(owner)
            .await
            .map_err(repository_error)
    }

    /// Resolve the project whose membership roll governs the owner entity.
    async fn resolve_project(&self, owner: AttachmentOwner) -> Result<ProjectId, Error> {
        match owner {
            AttachmentOwner::Project(id) => Ok(id),
            AttachmentOwner::Task(id) => {
                let task = self
                    .tasks
                    .find(id)
                    .await
                    .map_err(task_error)?
                    .ok_or_else(|| Error::not_found("task not found"))?;
                Ok(task.project)
            }
            AttachmentOwner::Comment(id) => {
                let comment = self
                    .comments
                    .find(id)
                    .await
                    .map_err(comment_error)?
                    .ok_or_else(|| Error::not_found("comment not found"))?;
                Ok(comment.project)
            }
        }
    }
}

fn repository_error(err: AttachmentRepositoryError) -> Error {
    match &err {
        AttachmentRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        AttachmentRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

fn task_error(err: TaskRepositoryError) -> Error {
    match &err {
        TaskRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        TaskRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

fn comment_error(err: CommentRepositoryError) -> Error {
    match &err {
        CommentRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        CommentRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ids::TaskId;
    use crate::domain::ports::{MemoryStore, ProjectRepository};
    use crate::domain::project::{MemberRole, Project, ProjectMembership};
    use crate::domain::side_effects::SideEffects;
    use crate::domain::task::{Task, TaskPriority, TaskStatus};

    struct Fixture {
        store: MemoryStore,
        service: AttachmentService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let projects: Arc<dyn ProjectRepository> = Arc::new(store.clone());
            let guard = Arc::new(AuthorizationGuard::new(projects));
            let service = AttachmentService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                guard,
            );
            Self { store, service }
        }

        async fn seed_project(&self, owner: UserId) -> Project {
            let project = Project::create("Alpha", "", owner);
            let membership = ProjectMembership::grant(project.id, owner, MemberRole::Admin);
            ProjectRepository::create(&self.store, &project, &membership, &SideEffects::none())
                .await
                .expect("seed project");
            project
        }

        async fn seed_task(&self, project: ProjectId, reporter: UserId) -> Task {
            let now = Utc::now();
            let task = Task {
                id: TaskId::random(),
                project,
                title: "Fix bug".into(),
                description: String::new(),
                status: TaskStatus::Todo,
                priority: TaskPriority::Medium,
                assignee: None,
                reporter,
                due_date: None,
                order: 0.0,
                created_at: now,
                updated_at: now,
            };
            TaskRepository::create(&self.store, &task, &SideEffects::none())
                .await
                .expect("seed task");
            task
        }
    }

    #[tokio::test]
    async fn attachment_access_follows_the_owning_task_project() {
        let fx = Fixture::new();
        let owner = UserId::random();
        let project = fx.seed_project(owner).await;
        let task = fx.seed_task(project.id, owner).await;

        let attachment = fx
            .service
            .create(owner, AttachmentOwner::Task(task.id), "uploads/spec.pdf")
            .await
            .expect("create");
        assert_eq!(attachment.uploaded_by, owner);

        let listed = fx
            .service
            .list(owner, AttachmentOwner::Task(task.id))
            .await
            .expect("list");
        assert_eq!(listed, vec![attachment]);

        let err = fx
            .service
            .list(UserId::random(), AttachmentOwner::Task(task.id))
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .service
            .create(
                UserId::random(),
                AttachmentOwner::Task(TaskId::random()),
                "uploads/file.txt",
            )
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn blank_file_path_is_rejected() {
        let fx = Fixture::new();
        let owner = UserId::random();
        let project = fx.seed_project(owner).await;

        let err = fx
            .service
            .create(owner, AttachmentOwner::Project(project.id), "  ")
            .await
            .expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
