//! Threaded discussion on projects and tasks.

use std::sync::Arc;

use chrono::Utc;

use super::authorization::AuthorizationGuard;
use super::comment::Comment;
use super::error::Error;
use super::ids::{CommentId, ProjectId, TaskId, UserId};
use super::ports::{
    CommentFilter, CommentRepository, CommentRepositoryError, TaskRepository,
    TaskRepositoryError,
};
use super::project::MemberRole;
use super::side_effects;

/// Input for posting a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub project: ProjectId,
    pub task: Option<TaskId>,
    pub parent: Option<CommentId>,
    pub body: String,
}

/// Application service for comments.
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    tasks: Arc<dyn TaskRepository>,
    guard: Arc<AuthorizationGuard>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        tasks: Arc<dyn TaskRepository>,
        guard: Arc<AuthorizationGuard>,
    ) -> Self {
        Self {
            comments,
            tasks,
            guard,
        }
    }

    /// Post a comment. The task, when given, must belong to the comment's
    /// project, and a reply must stay in its parent's thread.
    pub async fn create(&self, actor: UserId, input: NewComment) -> Result<Comment, Error> {
        self.guard.require_member(input.project, actor).await?;

        if input.body.trim().is_empty() {
            return Err(Error::invalid_request("comment body must not be empty"));
        }

        let task = match input.task {
            Some(id) => {
                let task = self
                    .tasks
                    .find(id)
                    .await
                    .map_err(task_repository_error)?
                    .ok_or_else(|| Error::not_found("task not found"))?;
                if task.project != input.project {
                    return Err(Error::invalid_request(
                        "task does not belong to the given project",
                    ));
                }
                Some(task)
            }
            None => None,
        };

        if let Some(parent_id) = input.parent {
            let parent = self
                .comments
                .find(parent_id)
                .await
                .map_err(repository_error)?
                .ok_or_else(|| Error::not_found("parent comment not found"))?;
            if parent.project != input.project || parent.task != input.task {
                return Err(Error::invalid_request(
                    "parent comment belongs to a different thread",
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: CommentId::random(),
            project: input.project,
            task: input.task,
            author: actor,
            parent: input.parent,
            body: input.body,
            created_at: now,
            updated_at: now,
        };
        let effects = side_effects::comment_created(&comment, task.as_ref());
        self.comments
            .create(&comment, &effects)
            .await
            .map_err(repository_error)?;
        Ok(comment)
    }

    /// Fetch one comment the actor may see.
    pub async fn get(&self, actor: UserId, id: CommentId) -> Result<Comment, Error> {
        let comment = self
            .comments
            .find(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        self.guard.require_member_of(&comment, actor).await?;
        Ok(comment)
    }

    /// List comments, newest first. Without a project to scope by the
    /// result is empty rather than an error.
    pub async fn list(
        &self,
        actor: UserId,
        project: Option<ProjectId>,
        task: Option<TaskId>,
    ) -> Result<Vec<Comment>, Error> {
        let Some(project) = project else {
            return Ok(Vec::new());
        };
        self.guard.require_member(project, actor).await?;
        self.comments
            .list(CommentFilter { project, task })
            .await
            .map_err(repository_error)
    }

    /// Delete a comment and its replies. Only the author or a project admin
    /// may delete.
    pub async fn delete(&self, actor: UserId, id: CommentId) -> Result<(), Error> {
        let comment = self
            .comments
            .find(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        let access = self.guard.require_member_of(&comment, actor).await?;

        if comment.author != actor && access.role != MemberRole::Admin {
            return Err(Error::forbidden(
                "only the author or a project admin may delete a comment",
            ));
        }
        self.comments.delete(id).await.map_err(repository_error)
    }
}

fn repository_error(err: CommentRepositoryError) -> Error {
    match &err {
        CommentRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        CommentRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

fn task_repository_error(err: TaskRepositoryError) -> Error {
    match &err {
        TaskRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        TaskRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}
