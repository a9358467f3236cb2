//! In-memory implementation of every repository port.
//!
//! Backs the unit and integration tests, and the server's fixture mode when
//! no database is configured. All state lives behind a single mutex, so a
//! composite write (primary row plus derived side-effect rows) is applied
//! under one lock acquisition and is atomic with respect to readers, which
//! mirrors the transactional guarantee of the Diesel adapters.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::activity::ActivityEntry;
use crate::domain::attachment::{Attachment, AttachmentOwner};
use crate::domain::comment::Comment;
use crate::domain::ids::{
    ActivityId, CommentId, NotificationId, ProjectId, TaskId, UserId,
};
use crate::domain::notification::Notification;
use crate::domain::project::{Project, ProjectMembership};
use crate::domain::side_effects::SideEffects;
use crate::domain::task::{Task, TaskStatusChange, WorkloadEntry};
use crate::domain::user::User;

use super::{
    ActivityRepository, ActivityRepositoryError, AttachmentRepository, AttachmentRepositoryError,
    CommentFilter, CommentRepository, CommentRepositoryError, NotificationRepository,
    NotificationRepositoryError, ProjectRepository, ProjectRepositoryError, TaskFilter,
    TaskRepository, TaskRepositoryError, UserRepository, UserRepositoryError,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    memberships: Vec<ProjectMembership>,
    tasks: HashMap<TaskId, Task>,
    watchers: HashSet<(TaskId, UserId)>,
    status_history: Vec<TaskStatusChange>,
    comments: HashMap<CommentId, Comment>,
    notifications: Vec<Notification>,
    activities: Vec<ActivityEntry>,
    attachments: Vec<Attachment>,
}

impl State {
    /// Materialise derived payloads into stored rows. Runs under the same
    /// lock as the primary write that produced them.
    fn apply_effects(&mut self, effects: &SideEffects) {
        let now = Utc::now();
        for payload in &effects.notifications {
            self.notifications.push(Notification {
                id: NotificationId::random(),
                user: payload.user,
                kind: payload.kind,
                project: payload.project,
                task: payload.task,
                comment: payload.comment,
                message: payload.message.clone(),
                is_read: false,
                created_at: now,
            });
        }
        for payload in &effects.activities {
            self.activities.push(ActivityEntry {
                id: ActivityId::random(),
                project: payload.project,
                actor: Some(payload.actor),
                verb: payload.verb.clone(),
                target: payload.target,
                target_id: payload.target_id,
                meta: payload.meta.clone(),
                created_at: now,
            });
        }
        for payload in &effects.status_changes {
            self.status_history.push(TaskStatusChange {
                task: payload.task,
                old_status: payload.old_status,
                new_status: payload.new_status,
                changed_by: payload.changed_by,
                changed_at: now,
            });
        }
    }

    fn remove_comment_tree(&mut self, id: CommentId) {
        let replies: Vec<CommentId> = self
            .comments
            .values()
            .filter(|c| c.parent == Some(id))
            .map(|c| c.id)
            .collect();
        for reply in replies {
            self.remove_comment_tree(reply);
        }
        self.comments.remove(&id);
        self.notifications.retain(|n| n.comment != Some(id));
        self.attachments
            .retain(|a| a.owner != AttachmentOwner::Comment(id));
    }

    fn remove_task(&mut self, id: TaskId) {
        self.tasks.remove(&id);
        self.watchers.retain(|(task, _)| *task != id);
        self.status_history.retain(|h| h.task != id);
        let comments: Vec<CommentId> = self
            .comments
            .values()
            .filter(|c| c.task == Some(id))
            .map(|c| c.id)
            .collect();
        for comment in comments {
            self.remove_comment_tree(comment);
        }
        self.notifications.retain(|n| n.task != Some(id));
        self.attachments
            .retain(|a| a.owner != AttachmentOwner::Task(id));
    }

    fn remove_project(&mut self, id: ProjectId) {
        let tasks: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.project == id)
            .map(|t| t.id)
            .collect();
        for task in tasks {
            self.remove_task(task);
        }
        let comments: Vec<CommentId> = self
            .comments
            .values()
            .filter(|c| c.project == id)
            .map(|c| c.id)
            .collect();
        for comment in comments {
            self.remove_comment_tree(comment);
        }
        self.projects.remove(&id);
        self.memberships.retain(|m| m.project != id);
        self.notifications.retain(|n| n.project != Some(id));
        self.activities.retain(|a| a.project != id);
        self.attachments
            .retain(|a| a.owner != AttachmentOwner::Project(id));
    }
}

/// Shared in-memory store; cloning yields a handle to the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user record. The identity store is externally owned, so this
    /// is the only way users enter the fixture.
    pub fn add_user(&self, user: User) {
        self.state().users.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.state().users.get(&id).cloned())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create(
        &self,
        project: &Project,
        owner_membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<(), ProjectRepositoryError> {
        let mut state = self.state();
        if state.projects.contains_key(&project.id) {
            return Err(ProjectRepositoryError::conflict("project id already exists"));
        }
        state.projects.insert(project.id, project.clone());
        state.memberships.push(owner_membership.clone());
        state.apply_effects(effects);
        Ok(())
    }

    async fn find(&self, id: ProjectId) -> Result<Option<Project>, ProjectRepositoryError> {
        Ok(self.state().projects.get(&id).cloned())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Project>, ProjectRepositoryError> {
        let state = self.state();
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| {
                p.owner == user
                    || state
                        .memberships
                        .iter()
                        .any(|m| m.project == p.id && m.user == user)
            })
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn update(&self, project: &Project) -> Result<(), ProjectRepositoryError> {
        let mut state = self.state();
        match state.projects.get_mut(&project.id) {
            Some(stored) => {
                *stored = project.clone();
                Ok(())
            }
            None => Err(ProjectRepositoryError::query("project not found")),
        }
    }

    async fn delete(&self, id: ProjectId) -> Result<(), ProjectRepositoryError> {
        self.state().remove_project(id);
        Ok(())
    }

    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<ProjectMembership>, ProjectRepositoryError> {
        Ok(self
            .state()
            .memberships
            .iter()
            .find(|m| m.project == project && m.user == user)
            .cloned())
    }

    async fn list_members(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMembership>, ProjectRepositoryError> {
        let mut members: Vec<ProjectMembership> = self
            .state()
            .memberships
            .iter()
            .filter(|m| m.project == project)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn upsert_membership(
        &self,
        membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<ProjectMembership, ProjectRepositoryError> {
        let mut state = self.state();
        let stored = match state
            .memberships
            .iter_mut()
            .find(|m| m.project == membership.project && m.user == membership.user)
        {
            Some(existing) => {
                existing.role = membership.role;
                existing.clone()
            }
            None => {
                state.memberships.push(membership.clone());
                membership.clone()
            }
        };
        state.apply_effects(effects);
        Ok(stored)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError> {
        let mut state = self.state();
        state.tasks.insert(task.id, task.clone());
        state.apply_effects(effects);
        Ok(())
    }

    async fn find(&self, id: TaskId) -> Result<Option<Task>, TaskRepositoryError> {
        Ok(self.state().tasks.get(&id).cloned())
    }

    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut tasks: Vec<Task> = self
            .state()
            .tasks
            .values()
            .filter(|t| t.project == filter.project)
            .filter(|t| filter.status.is_none_or(|status| t.status == status))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.order
                .total_cmp(&b.order)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(tasks)
    }

    async fn update(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError> {
        let mut state = self.state();
        match state.tasks.get_mut(&task.id) {
            Some(stored) => *stored = task.clone(),
            None => return Err(TaskRepositoryError::query("task not found")),
        }
        state.apply_effects(effects);
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), TaskRepositoryError> {
        self.state().remove_task(id);
        Ok(())
    }

    async fn add_watcher(&self, task: TaskId, user: UserId) -> Result<(), TaskRepositoryError> {
        self.state().watchers.insert((task, user));
        Ok(())
    }

    async fn status_history(
        &self,
        task: TaskId,
    ) -> Result<Vec<TaskStatusChange>, TaskRepositoryError> {
        Ok(self
            .state()
            .status_history
            .iter()
            .filter(|h| h.task == task)
            .cloned()
            .collect())
    }

    async fn workload(
        &self,
        project: ProjectId,
    ) -> Result<Vec<WorkloadEntry>, TaskRepositoryError> {
        let state = self.state();
        let mut counts: HashMap<UserId, i64> = HashMap::new();
        for task in state.tasks.values() {
            if task.project != project || !task.status.is_open() {
                continue;
            }
            if let Some(assignee) = task.assignee {
                *counts.entry(assignee).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<WorkloadEntry> = counts
            .into_iter()
            .map(|(assignee, open_tasks)| WorkloadEntry {
                assignee,
                open_tasks,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.open_tasks
                .cmp(&a.open_tasks)
                .then_with(|| a.assignee.cmp(&b.assignee))
        });
        Ok(entries)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(
        &self,
        comment: &Comment,
        effects: &SideEffects,
    ) -> Result<(), CommentRepositoryError> {
        let mut state = self.state();
        state.comments.insert(comment.id, comment.clone());
        state.apply_effects(effects);
        Ok(())
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        Ok(self.state().comments.get(&id).cloned())
    }

    async fn list(&self, filter: CommentFilter) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut comments: Vec<Comment> = self
            .state()
            .comments
            .values()
            .filter(|c| c.project == filter.project)
            .filter(|c| filter.task.is_none_or(|task| c.task == Some(task)))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn delete(&self, id: CommentId) -> Result<(), CommentRepositoryError> {
        self.state().remove_comment_tree(id);
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let state = self.state();
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user == user)
            .cloned()
            .collect();
        notifications.reverse();
        Ok(notifications)
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, NotificationRepositoryError> {
        let mut state = self.state();
        let mut updated = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.user == user && !n.is_read)
        {
            notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn list_for_project(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ActivityEntry>, ActivityRepositoryError> {
        let state = self.state();
        let mut entries: Vec<ActivityEntry> = state
            .activities
            .iter()
            .filter(|a| a.project == project)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

#[async_trait]
impl AttachmentRepository for MemoryStore {
    async fn create(&self, attachment: &Attachment) -> Result<(), AttachmentRepositoryError> {
        self.state().attachments.push(attachment.clone());
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, AttachmentRepositoryError> {
        let state = self.state();
        let mut attachments: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect();
        attachments.reverse();
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{NewNotification, NotificationKind};
    use crate::domain::project::MemberRole;

    fn user() -> User {
        User {
            id: UserId::random(),
            username: "u".into(),
            email: "u@example.com".into(),
            full_name: String::new(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn project_create_is_atomic_with_membership_and_effects() {
        let store = MemoryStore::new();
        let owner = user();
        store.add_user(owner.clone());

        let project = Project::create("Alpha", "", owner.id);
        let membership = ProjectMembership::grant(project.id, owner.id, MemberRole::Admin);
        let effects = crate::domain::side_effects::project_created(&project);
        ProjectRepository::create(&store, &project, &membership, &effects)
            .await
            .expect("create");

        let found = ProjectRepository::find(&store, project.id)
            .await
            .expect("find");
        assert_eq!(found, Some(project.clone()));
        let stored = store
            .find_membership(project.id, owner.id)
            .await
            .expect("membership");
        assert_eq!(stored.map(|m| m.role), Some(MemberRole::Admin));
        let feed = store.list_for_project(project.id).await.expect("feed");
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn upsert_membership_never_duplicates_the_pair() {
        let store = MemoryStore::new();
        let owner = user();
        let invitee = user();
        let project = Project::create("Alpha", "", owner.id);
        let membership = ProjectMembership::grant(project.id, owner.id, MemberRole::Admin);
        ProjectRepository::create(&store, &project, &membership, &SideEffects::none())
            .await
            .expect("create");

        let first = ProjectMembership::grant(project.id, invitee.id, MemberRole::Member);
        store
            .upsert_membership(&first, &SideEffects::none())
            .await
            .expect("insert");
        let second = ProjectMembership::grant(project.id, invitee.id, MemberRole::Admin);
        let stored = store
            .upsert_membership(&second, &SideEffects::none())
            .await
            .expect("upsert");

        assert_eq!(stored.role, MemberRole::Admin);
        let members = store.list_members(project.id).await.expect("members");
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn mark_all_read_is_idempotent_and_scoped_to_the_user() {
        let store = MemoryStore::new();
        let alice = user();
        let bob = user();
        let effects = SideEffects {
            notifications: vec![
                NewNotification {
                    user: alice.id,
                    kind: NotificationKind::ProjectInvite,
                    project: None,
                    task: None,
                    comment: None,
                    message: "one".into(),
                },
                NewNotification {
                    user: bob.id,
                    kind: NotificationKind::ProjectInvite,
                    project: None,
                    task: None,
                    comment: None,
                    message: "two".into(),
                },
            ],
            ..SideEffects::none()
        };
        store.state().apply_effects(&effects);

        assert_eq!(store.mark_all_read(alice.id).await.expect("first"), 1);
        assert_eq!(store.mark_all_read(alice.id).await.expect("second"), 0);
        let bobs = NotificationRepository::list_for_user(&store, bob.id)
            .await
            .expect("list");
        assert!(bobs.iter().all(|n| !n.is_read));
    }

    #[tokio::test]
    async fn deleting_a_project_cascades_to_owned_rows() {
        let store = MemoryStore::new();
        let owner = user();
        let project = Project::create("Alpha", "", owner.id);
        let membership = ProjectMembership::grant(project.id, owner.id, MemberRole::Admin);
        let effects = crate::domain::side_effects::project_created(&project);
        ProjectRepository::create(&store, &project, &membership, &effects)
            .await
            .expect("create");

        ProjectRepository::delete(&store, project.id)
            .await
            .expect("delete");
        assert!(
            ProjectRepository::find(&store, project.id)
                .await
                .expect("find")
                .is_none()
        );
        assert!(
            store
                .list_members(project.id)
                .await
                .expect("members")
                .is_empty()
        );
        assert!(
            store
                .list_for_project(project.id)
                .await
                .expect("feed")
                .is_empty()
        );
    }
}
