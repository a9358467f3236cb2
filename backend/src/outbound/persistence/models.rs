//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Each struct doubles as the read and write
//! shape of its table because inserts carry the full row, ids and timestamps
//! included.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::activity::{ActivityEntry, ActivityTarget};
use crate::domain::attachment::{Attachment, AttachmentOwner};
use crate::domain::comment::Comment;
use crate::domain::ids::{
    ActivityId, AttachmentId, CommentId, NotificationId, ProjectId, TaskId, UserId,
};
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::project::{MemberRole, Project, ProjectMembership};
use crate::domain::task::{Task, TaskPriority, TaskStatus, TaskStatusChange};
use crate::domain::user::User;

use super::schema::{
    activity_log, attachments, comments, notifications, project_memberships, projects,
    task_status_history, tasks, users,
};

/// Parse a stored enum string, falling back to a default when the value is
/// unrecognised. Rows written by this adapter always round-trip; the warning
/// only fires on hand-edited data.
fn parse_or<T: std::str::FromStr + Copy>(value: &str, column: &str, fallback: T) -> T {
    value.parse().unwrap_or_else(|_| {
        warn!(value, column, "unrecognised stored value, using fallback");
        fallback
    })
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            owner: UserId::from_uuid(row.owner_id),
            is_archived: row.is_archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: *project.id.as_uuid(),
            name: project.name.clone(),
            description: project.description.clone(),
            owner_id: *project.owner.as_uuid(),
            is_archived: project.is_archived,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = project_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRow {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl From<MembershipRow> for ProjectMembership {
    fn from(row: MembershipRow) -> Self {
        Self {
            project: ProjectId::from_uuid(row.project_id),
            user: UserId::from_uuid(row.user_id),
            role: parse_or(&row.role, "project_memberships.role", MemberRole::Viewer),
            joined_at: row.joined_at,
        }
    }
}

impl From<&ProjectMembership> for MembershipRow {
    fn from(membership: &ProjectMembership) -> Self {
        Self {
            project_id: *membership.project.as_uuid(),
            user_id: *membership.user.as_uuid(),
            role: membership.role.as_str().to_owned(),
            joined_at: membership.joined_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Uuid,
    pub due_date: Option<NaiveDate>,
    pub ordering: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: TaskId::from_uuid(row.id),
            project: ProjectId::from_uuid(row.project_id),
            title: row.title,
            description: row.description,
            status: parse_or(&row.status, "tasks.status", TaskStatus::Todo),
            priority: parse_or(&row.priority, "tasks.priority", TaskPriority::Medium),
            assignee: row.assignee_id.map(UserId::from_uuid),
            reporter: UserId::from_uuid(row.reporter_id),
            due_date: row.due_date,
            order: row.ordering,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: *task.id.as_uuid(),
            project_id: *task.project.as_uuid(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.as_str().to_owned(),
            priority: task.priority.as_str().to_owned(),
            assignee_id: task.assignee.map(|id| *id.as_uuid()),
            reporter_id: *task.reporter.as_uuid(),
            due_date: task.due_date,
            ordering: task.order,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StatusChangeRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

impl From<StatusChangeRow> for TaskStatusChange {
    fn from(row: StatusChangeRow) -> Self {
        Self {
            task: TaskId::from_uuid(row.task_id),
            old_status: parse_or(
                &row.old_status,
                "task_status_history.old_status",
                TaskStatus::Todo,
            ),
            new_status: parse_or(
                &row.new_status,
                "task_status_history.new_status",
                TaskStatus::Todo,
            ),
            changed_by: UserId::from_uuid(row.changed_by),
            changed_at: row.changed_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub task_id: Option<Uuid>,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::from_uuid(row.id),
            project: ProjectId::from_uuid(row.project_id),
            task: row.task_id.map(TaskId::from_uuid),
            author: UserId::from_uuid(row.author_id),
            parent: row.parent_id.map(CommentId::from_uuid),
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            id: *comment.id.as_uuid(),
            project_id: *comment.project.as_uuid(),
            task_id: comment.task.map(|id| *id.as_uuid()),
            author_id: *comment.author.as_uuid(),
            parent_id: comment.parent.map(|id| *id.as_uuid()),
            body: comment.body.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::from_uuid(row.id),
            user: UserId::from_uuid(row.user_id),
            kind: parse_or(
                &row.kind,
                "notifications.kind",
                NotificationKind::TaskUpdated,
            ),
            project: row.project_id.map(ProjectId::from_uuid),
            task: row.task_id.map(TaskId::from_uuid),
            comment: row.comment_id.map(CommentId::from_uuid),
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = activity_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ActivityRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub verb: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: ActivityId::from_uuid(row.id),
            project: ProjectId::from_uuid(row.project_id),
            actor: row.actor_id.map(UserId::from_uuid),
            verb: row.verb,
            target: parse_or(
                &row.target_type,
                "activity_log.target_type",
                ActivityTarget::Project,
            ),
            target_id: row.target_id,
            meta: row.meta,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttachmentRow {
    pub id: Uuid,
    pub file_path: String,
    pub uploaded_by: Uuid,
    pub owner_type: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRow {
    pub(crate) fn owner_parts(owner: AttachmentOwner) -> (&'static str, Uuid) {
        match owner {
            AttachmentOwner::Project(id) => ("project", *id.as_uuid()),
            AttachmentOwner::Task(id) => ("task", *id.as_uuid()),
            AttachmentOwner::Comment(id) => ("comment", *id.as_uuid()),
        }
    }

    fn owner(&self) -> AttachmentOwner {
        match self.owner_type.as_str() {
            "task" => AttachmentOwner::Task(TaskId::from_uuid(self.owner_id)),
            "comment" => AttachmentOwner::Comment(CommentId::from_uuid(self.owner_id)),
            "project" => AttachmentOwner::Project(ProjectId::from_uuid(self.owner_id)),
            other => {
                warn!(
                    value = other,
                    column = "attachments.owner_type",
                    "unrecognised stored value, using fallback"
                );
                AttachmentOwner::Project(ProjectId::from_uuid(self.owner_id))
            }
        }
    }
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        let owner = row.owner();
        Self {
            id: AttachmentId::from_uuid(row.id),
            file_path: row.file_path,
            uploaded_by: UserId::from_uuid(row.uploaded_by),
            owner,
            created_at: row.created_at,
        }
    }
}

impl From<&Attachment> for AttachmentRow {
    fn from(attachment: &Attachment) -> Self {
        let (owner_type, owner_id) = Self::owner_parts(attachment.owner);
        Self {
            id: *attachment.id.as_uuid(),
            file_path: attachment.file_path.clone(),
            uploaded_by: *attachment.uploaded_by.as_uuid(),
            owner_type: owner_type.to_owned(),
            owner_id,
            created_at: attachment.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_rows_round_trip_through_the_domain() {
        let now = Utc::now();
        let task = Task {
            id: TaskId::random(),
            project: ProjectId::random(),
            title: "Fix bug".into(),
            description: "details".into(),
            status: TaskStatus::Blocked,
            priority: TaskPriority::Urgent,
            assignee: Some(UserId::random()),
            reporter: UserId::random(),
            due_date: None,
            order: 3.5,
            created_at: now,
            updated_at: now,
        };

        let row = TaskRow::from(&task);
        assert_eq!(row.status, "blocked");
        assert_eq!(row.ordering, 3.5);
        assert_eq!(Task::from(row), task);
    }

    #[test]
    fn unknown_status_strings_fall_back_to_todo() {
        assert_eq!(
            parse_or("cancelled", "tasks.status", TaskStatus::Todo),
            TaskStatus::Todo
        );
    }

    #[test]
    fn attachment_owner_round_trips() {
        let owner = AttachmentOwner::Comment(CommentId::random());
        let attachment = Attachment {
            id: AttachmentId::random(),
            file_path: "uploads/a.txt".into(),
            uploaded_by: UserId::random(),
            owner,
            created_at: Utc::now(),
        };
        let row = AttachmentRow::from(&attachment);
        assert_eq!(row.owner_type, "comment");
        assert_eq!(Attachment::from(row), attachment);
    }
}
