//! Task lifecycle, watchers, status history, and workload summaries.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::authorization::AuthorizationGuard;
use super::error::Error;
use super::ids::{ProjectId, TaskId, UserId};
use super::ports::{TaskFilter, TaskRepository, TaskRepositoryError, UserRepository};
use super::side_effects;
use super::task::{Task, TaskPriority, TaskStatus, TaskStatusChange, WorkloadEntry};

/// Input for creating a task. Omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project: ProjectId,
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub order: Option<f64>,
}

/// Partial update to a task. Outer `None` leaves the field untouched; for
/// the nullable fields the inner `None` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub order: Option<f64>,
}

/// Application service for tasks.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    guard: Arc<AuthorizationGuard>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        guard: Arc<AuthorizationGuard>,
    ) -> Self {
        Self {
            tasks,
            users,
            guard,
        }
    }

    /// Create a task in a project the actor is a member of. The actor
    /// becomes the reporter.
    pub async fn create(&self, actor: UserId, input: NewTask) -> Result<Task, Error> {
        let access = self.guard.require_member(input.project, actor).await?;

        let title = input.title.trim().to_owned();
        if title.is_empty() {
            return Err(Error::invalid_request("task title must not be empty"));
        }
        if let Some(assignee) = input.assignee {
            self.require_known_user(assignee).await?;
        }

        let now = Utc::now();
        let task = Task {
            id: TaskId::random(),
            project: input.project,
            title,
            description: input.description,
            status: input.status.unwrap_or(TaskStatus::Todo),
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            assignee: input.assignee,
            reporter: actor,
            due_date: input.due_date,
            order: input.order.unwrap_or(0.0),
            created_at: now,
            updated_at: now,
        };
        let effects = side_effects::task_created(&task, &access.project);
        self.tasks
            .create(&task, &effects)
            .await
            .map_err(repository_error)?;
        Ok(task)
    }

    /// List a project's tasks, ordered by rank then recency. Without a
    /// project to scope by there is nothing the actor may see, so `None`
    /// yields an empty list rather than an error.
    pub async fn list(
        &self,
        actor: UserId,
        project: Option<ProjectId>,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, Error> {
        let Some(project) = project else {
            return Ok(Vec::new());
        };
        self.guard.require_member(project, actor).await?;
        self.tasks
            .list(TaskFilter { project, status })
            .await
            .map_err(repository_error)
    }

    /// Fetch one task the actor may see.
    pub async fn get(&self, actor: UserId, id: TaskId) -> Result<Task, Error> {
        let task = self.find_task(id).await?;
        self.guard.require_member_of(&task, actor).await?;
        Ok(task)
    }

    /// Apply a partial update and derive its side effects from the before
    /// and after snapshots.
    pub async fn update(
        &self,
        actor: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<Task, Error> {
        let before = self.find_task(id).await?;
        let access = self.guard.require_member_of(&before, actor).await?;

        if let Some(Some(assignee)) = changes.assignee {
            self.require_known_user(assignee).await?;
        }

        let mut after = before.clone();
        if let Some(title) = changes.title {
            let title = title.trim().to_owned();
            if title.is_empty() {
                return Err(Error::invalid_request("task title must not be empty"));
            }
            after.title = title;
        }
        if let Some(description) = changes.description {
            after.description = description;
        }
        if let Some(status) = changes.status {
            after.status = status;
        }
        if let Some(priority) = changes.priority {
            after.priority = priority;
        }
        if let Some(assignee) = changes.assignee {
            after.assignee = assignee;
        }
        if let Some(due_date) = changes.due_date {
            after.due_date = due_date;
        }
        if let Some(order) = changes.order {
            after.order = order;
        }
        after.updated_at = Utc::now();

        let effects = side_effects::task_updated(&before, &after, &access.project, actor);
        self.tasks
            .update(&after, &effects)
            .await
            .map_err(repository_error)?;
        Ok(after)
    }

    /// Delete a task; its comments, watchers, and history cascade.
    pub async fn delete(&self, actor: UserId, id: TaskId) -> Result<(), Error> {
        let task = self.find_task(id).await?;
        self.guard.require_member_of(&task, actor).await?;
        self.tasks.delete(id).await.map_err(repository_error)
    }

    /// Subscribe the actor to a task. Watching twice is a no-op.
    pub async fn watch(&self, actor: UserId, id: TaskId) -> Result<(), Error> {
        let task = self.find_task(id).await?;
        self.guard.require_member_of(&task, actor).await?;
        self.tasks
            .add_watcher(id, actor)
            .await
            .map_err(repository_error)
    }

    /// The task's status transitions in chronological order.
    pub async fn status_history(
        &self,
        actor: UserId,
        id: TaskId,
    ) -> Result<Vec<TaskStatusChange>, Error> {
        let task = self.find_task(id).await?;
        self.guard.require_member_of(&task, actor).await?;
        self.tasks.status_history(id).await.map_err(repository_error)
    }

    /// Open-task counts per assignee for one project, heaviest first.
    pub async fn workload(
        &self,
        actor: UserId,
        project: ProjectId,
    ) -> Result<Vec<WorkloadEntry>, Error> {
        self.guard.require_member(project, actor).await?;
        self.tasks.workload(project).await.map_err(repository_error)
    }

    async fn find_task(&self, id: TaskId) -> Result<Task, Error> {
        self.tasks
            .find(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| Error::not_found("task not found"))
    }

    async fn require_known_user(&self, id: UserId) -> Result<(), Error> {
        self.users
            .find(id)
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?
            .ok_or_else(|| Error::invalid_request("assignee is not a known user"))?;
        Ok(())
    }
}

fn repository_error(err: TaskRepositoryError) -> Error {
    match &err {
        TaskRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        TaskRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::notification::NotificationKind;
    use crate::domain::ports::{
        MemoryStore, NotificationRepository, ProjectRepository,
    };
    use crate::domain::project::{MemberRole, Project, ProjectMembership};
    use crate::domain::user::User;

    struct Fixture {
        store: MemoryStore,
        service: TaskService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let projects: Arc<dyn ProjectRepository> = Arc::new(store.clone());
            let guard = Arc::new(AuthorizationGuard::new(projects));
            let service =
                TaskService::new(Arc::new(store.clone()), Arc::new(store.clone()), guard);
            Self { store, service }
        }

        fn seed_user(&self, username: &str) -> UserId {
            let user = User {
                id: UserId::random(),
                username: username.to_owned(),
                email: format!("{username}@example.com"),
                full_name: String::new(),
                avatar_url: None,
                created_at: Utc::now(),
            };
            let id = user.id;
            self.store.add_user(user);
            id
        }

        async fn seed_project(&self, owner: UserId, members: &[UserId]) -> Project {
            let project = Project::create("Alpha", "", owner);
            let membership = ProjectMembership::grant(project.id, owner, MemberRole::Admin);
            ProjectRepository::create(
                &self.store,
                &project,
                &membership,
                &side_effects::SideEffects::none(),
            )
            .await
            .expect("seed project");
            for member in members {
                self.store
                    .upsert_membership(
                        &ProjectMembership::grant(project.id, *member, MemberRole::Member),
                        &side_effects::SideEffects::none(),
                    )
                    .await
                    .expect("seed member");
            }
            project
        }
    }

    fn new_task(project: ProjectId, title: &str) -> NewTask {
        NewTask {
            project,
            title: title.to_owned(),
            description: String::new(),
            status: None,
            priority: None,
            assignee: None,
            due_date: None,
            order: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_todo_medium_with_actor_as_reporter() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let project = fx.seed_project(owner, &[]).await;

        let task = fx
            .service
            .create(owner, new_task(project.id, "Fix bug"))
            .await
            .expect("create");

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.reporter, owner);
        assert_eq!(task.assignee, None);
    }

    #[tokio::test]
    async fn create_rejects_unknown_assignee() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let project = fx.seed_project(owner, &[]).await;

        let mut input = new_task(project.id, "Fix bug");
        input.assignee = Some(UserId::random());
        let err = fx.service.create(owner, input).await.expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn create_is_denied_for_non_members() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let stranger = fx.seed_user("stranger");
        let project = fx.seed_project(owner, &[]).await;

        let err = fx
            .service
            .create(stranger, new_task(project.id, "Fix bug"))
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn list_without_a_project_is_empty() {
        let fx = Fixture::new();
        let user = fx.seed_user("user");
        let tasks = fx.service.list(user, None, None).await.expect("list");
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_status_and_orders_by_rank() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let project = fx.seed_project(owner, &[]).await;

        let mut first = new_task(project.id, "ranked second");
        first.order = Some(2.0);
        let mut second = new_task(project.id, "ranked first");
        second.order = Some(1.0);
        let mut done = new_task(project.id, "already done");
        done.status = Some(TaskStatus::Done);
        fx.service.create(owner, first).await.expect("first");
        fx.service.create(owner, second).await.expect("second");
        fx.service.create(owner, done).await.expect("done");

        let all = fx
            .service
            .list(owner, Some(project.id), None)
            .await
            .expect("all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "ranked first");
        assert_eq!(all[1].title, "ranked second");

        let open = fx
            .service
            .list(owner, Some(project.id), Some(TaskStatus::Todo))
            .await
            .expect("open");
        assert_eq!(open.len(), 2);
    }

    #[tokio::test]
    async fn status_update_records_history_and_notifies_assignee() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let assignee = fx.seed_user("assignee");
        let project = fx.seed_project(owner, &[assignee]).await;

        let mut input = new_task(project.id, "Fix bug");
        input.assignee = Some(assignee);
        let task = fx.service.create(owner, input).await.expect("create");

        let updated = fx
            .service
            .update(
                owner,
                task.id,
                TaskChanges {
                    status: Some(TaskStatus::InProgress),
                    ..TaskChanges::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.status, TaskStatus::InProgress);

        let history = fx
            .service
            .status_history(owner, task.id)
            .await
            .expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, TaskStatus::Todo);
        assert_eq!(history[0].new_status, TaskStatus::InProgress);

        let inbox = NotificationRepository::list_for_user(&fx.store, assignee)
            .await
            .expect("inbox");
        let kinds: Vec<NotificationKind> = inbox.iter().map(|n| n.kind).collect();
        assert!(kinds.contains(&NotificationKind::TaskAssigned));
        assert!(kinds.contains(&NotificationKind::TaskUpdated));
    }

    #[tokio::test]
    async fn flip_flopping_status_appends_two_history_rows() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let project = fx.seed_project(owner, &[]).await;
        let task = fx
            .service
            .create(owner, new_task(project.id, "Fix bug"))
            .await
            .expect("create");

        for status in [TaskStatus::Done, TaskStatus::Todo] {
            fx.service
                .update(
                    owner,
                    task.id,
                    TaskChanges {
                        status: Some(status),
                        ..TaskChanges::default()
                    },
                )
                .await
                .expect("update");
        }

        let history = fx
            .service
            .status_history(owner, task.id)
            .await
            .expect("history");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn clearing_the_assignee_uses_the_inner_option() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let assignee = fx.seed_user("assignee");
        let project = fx.seed_project(owner, &[assignee]).await;
        let mut input = new_task(project.id, "Fix bug");
        input.assignee = Some(assignee);
        let task = fx.service.create(owner, input).await.expect("create");

        let updated = fx
            .service
            .update(
                owner,
                task.id,
                TaskChanges {
                    assignee: Some(None),
                    ..TaskChanges::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.assignee, None);
    }

    #[tokio::test]
    async fn workload_counts_open_tasks_per_assignee() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let busy = fx.seed_user("busy");
        let idle = fx.seed_user("idle");
        let project = fx.seed_project(owner, &[busy, idle]).await;

        for title in ["one", "two"] {
            let mut input = new_task(project.id, title);
            input.assignee = Some(busy);
            fx.service.create(owner, input).await.expect("create");
        }
        let mut done = new_task(project.id, "done");
        done.assignee = Some(idle);
        done.status = Some(TaskStatus::Done);
        fx.service.create(owner, done).await.expect("create");
        fx.service
            .create(owner, new_task(project.id, "unassigned"))
            .await
            .expect("create");

        let workload = fx
            .service
            .workload(owner, project.id)
            .await
            .expect("workload");
        assert_eq!(workload.len(), 1);
        assert_eq!(workload[0].assignee, busy);
        assert_eq!(workload[0].open_tasks, 2);
    }

    #[tokio::test]
    async fn watch_is_idempotent() {
        let fx = Fixture::new();
        let owner = fx.seed_user("owner");
        let project = fx.seed_project(owner, &[]).await;
        let task = fx
            .service
            .create(owner, new_task(project.id, "Fix bug"))
            .await
            .expect("create");

        fx.service.watch(owner, task.id).await.expect("first");
        fx.service.watch(owner, task.id).await.expect("second");
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let fx = Fixture::new();
        let user = fx.seed_user("user");
        let err = fx
            .service
            .get(user, TaskId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
