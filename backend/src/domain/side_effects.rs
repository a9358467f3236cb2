//! Side-effect pipeline: derives the secondary records a primary write must
//! produce.
//!
//! Every mutating operation derives zero or more [`NewNotification`],
//! [`NewActivityEntry`], and [`NewStatusChange`] payloads from the before and
//! after state of the primary entity. Derivation is pure: one call produces
//! one fixed set of payloads for one primary write. Persistence adapters
//! write the payloads in the same transaction as the primary row, so the two
//! commit together or not at all. The pipeline does not deduplicate across
//! request retries; a retried primary write derives a fresh set of rows.

use serde_json::json;

use super::activity::{ActivityTarget, NewActivityEntry};
use super::comment::Comment;
use super::ids::UserId;
use super::notification::{NewNotification, NotificationKind};
use super::project::{MemberRole, Project};
use super::task::{NewStatusChange, Task};

/// Verb recorded when an entity is created.
pub const VERB_CREATED: &str = "created";
/// Verb recorded when a task is updated.
pub const VERB_UPDATED: &str = "updated";
/// Verb recorded when a member is added to a project.
pub const VERB_ADDED_MEMBER: &str = "added_member";
/// Verb recorded when a comment is posted.
pub const VERB_COMMENTED: &str = "commented";

/// Maximum number of characters of free text copied into activity metadata.
const META_SNIPPET_CHARS: usize = 100;

/// The full set of derived records for one primary write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideEffects {
    pub notifications: Vec<NewNotification>,
    pub activities: Vec<NewActivityEntry>,
    pub status_changes: Vec<NewStatusChange>,
}

impl SideEffects {
    /// An empty effect set.
    pub fn none() -> Self {
        Self::default()
    }

    /// True when the pipeline derived nothing for this write.
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
            && self.activities.is_empty()
            && self.status_changes.is_empty()
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(META_SNIPPET_CHARS).collect()
}

/// Effects of creating a project.
///
/// The owner's admin membership row is part of the primary write itself (the
/// project must not exist without it), so it is not represented here; this
/// derives the single `created` audit entry.
pub fn project_created(project: &Project) -> SideEffects {
    SideEffects {
        activities: vec![NewActivityEntry {
            project: project.id,
            actor: project.owner,
            verb: VERB_CREATED.to_owned(),
            target: ActivityTarget::Project,
            target_id: *project.id.as_uuid(),
            meta: json!({
                "project_name": project.name,
                "project_description": snippet(&project.description),
            }),
        }],
        ..SideEffects::none()
    }
}

/// Effects of adding (or re-adding) a member to a project.
///
/// The invited user is notified even when the add only changed their role;
/// the operation is an upsert and its effect set does not depend on whether
/// a row already existed.
pub fn member_added(
    project: &Project,
    user: UserId,
    role: MemberRole,
    actor: UserId,
) -> SideEffects {
    SideEffects {
        notifications: vec![NewNotification {
            user,
            kind: NotificationKind::ProjectInvite,
            project: Some(project.id),
            task: None,
            comment: None,
            message: format!("You were added to project \"{}\"", project.name),
        }],
        activities: vec![NewActivityEntry {
            project: project.id,
            actor,
            verb: VERB_ADDED_MEMBER.to_owned(),
            target: ActivityTarget::Project,
            target_id: *project.id.as_uuid(),
            meta: json!({
                "user_id": user.to_string(),
                "role": role.as_str(),
            }),
        }],
        ..SideEffects::none()
    }
}

/// Effects of creating a task.
///
/// The reporter is the acting user, so an assignee equal to the reporter is
/// a self-assignment and produces no notification.
pub fn task_created(task: &Task, project: &Project) -> SideEffects {
    let mut effects = SideEffects {
        activities: vec![NewActivityEntry {
            project: task.project,
            actor: task.reporter,
            verb: VERB_CREATED.to_owned(),
            target: ActivityTarget::Task,
            target_id: *task.id.as_uuid(),
            meta: json!({
                "task_title": task.title,
                "status": task.status.as_str(),
                "priority": task.priority.as_str(),
                "assignee": task.assignee.map(|id| id.to_string()),
            }),
        }],
        ..SideEffects::none()
    };

    if let Some(assignee) = task.assignee
        && assignee != task.reporter
    {
        effects.notifications.push(NewNotification {
            user: assignee,
            kind: NotificationKind::TaskAssigned,
            project: Some(task.project),
            task: Some(task.id),
            comment: None,
            message: format!(
                "You were assigned task \"{}\" in project \"{}\"",
                task.title, project.name
            ),
        });
    }

    effects
}

/// Effects of updating a task.
///
/// `before` is the snapshot read before applying the changes; concurrent
/// updates race under last-write-wins. Derived records:
///
/// - assignee changed → `task_assigned` to the new assignee, unless the new
///   assignee is the actor;
/// - status changed → one status-history row, a `task_updated` notification
///   to the current assignee (unless the assignee is the actor), and an
///   `updated` audit entry.
///
/// An update touching neither field derives nothing.
pub fn task_updated(before: &Task, after: &Task, project: &Project, actor: UserId) -> SideEffects {
    let mut effects = SideEffects::none();

    if after.assignee != before.assignee
        && let Some(assignee) = after.assignee
        && assignee != actor
    {
        effects.notifications.push(NewNotification {
            user: assignee,
            kind: NotificationKind::TaskAssigned,
            project: Some(after.project),
            task: Some(after.id),
            comment: None,
            message: format!(
                "You were assigned task \"{}\" in project \"{}\"",
                after.title, project.name
            ),
        });
    }

    if after.status != before.status {
        effects.status_changes.push(NewStatusChange {
            task: after.id,
            old_status: before.status,
            new_status: after.status,
            changed_by: actor,
        });

        if let Some(assignee) = after.assignee
            && assignee != actor
        {
            effects.notifications.push(NewNotification {
                user: assignee,
                kind: NotificationKind::TaskUpdated,
                project: Some(after.project),
                task: Some(after.id),
                comment: None,
                message: format!(
                    "Task \"{}\" status changed to {}",
                    after.title,
                    after.status.label()
                ),
            });
        }

        effects.activities.push(NewActivityEntry {
            project: after.project,
            actor,
            verb: VERB_UPDATED.to_owned(),
            target: ActivityTarget::Task,
            target_id: *after.id.as_uuid(),
            meta: json!({
                "task_title": after.title,
                "old_status": before.status.as_str(),
                "new_status": after.status.as_str(),
            }),
        });
    }

    effects
}

/// Effects of creating a comment.
///
/// `task` is the task the comment is attached to, when any; its assignee is
/// notified unless absent or equal to the comment's author.
pub fn comment_created(comment: &Comment, task: Option<&Task>) -> SideEffects {
    let mut effects = SideEffects {
        activities: vec![NewActivityEntry {
            project: comment.project,
            actor: comment.author,
            verb: VERB_COMMENTED.to_owned(),
            target: ActivityTarget::Comment,
            target_id: *comment.id.as_uuid(),
            meta: json!({
                "comment_body": snippet(&comment.body),
                "task_id": comment.task.map(|id| id.to_string()),
                "task_title": task.map(|t| t.title.clone()),
            }),
        }],
        ..SideEffects::none()
    };

    if let Some(task) = task
        && let Some(assignee) = task.assignee
        && assignee != comment.author
    {
        effects.notifications.push(NewNotification {
            user: assignee,
            kind: NotificationKind::CommentAdded,
            project: Some(comment.project),
            task: Some(task.id),
            comment: Some(comment.id),
            message: format!("New comment on task \"{}\"", task.title),
        });
    }

    effects
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::ids::{CommentId, ProjectId, TaskId};
    use crate::domain::task::{TaskPriority, TaskStatus};

    fn project(owner: UserId) -> Project {
        Project::create("Alpha", "first project", owner)
    }

    fn task(project: &Project, reporter: UserId, assignee: Option<UserId>) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::random(),
            project: project.id,
            title: "Fix bug".into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee,
            reporter,
            due_date: None,
            order: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn comment(project: &Project, task: Option<&Task>, author: UserId) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::random(),
            project: project.id,
            task: task.map(|t| t.id),
            author,
            parent: None,
            body: "looks wrong".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn project_creation_derives_one_created_activity() {
        let owner = UserId::random();
        let effects = project_created(&project(owner));

        assert!(effects.notifications.is_empty());
        assert!(effects.status_changes.is_empty());
        assert_eq!(effects.activities.len(), 1);
        let activity = &effects.activities[0];
        assert_eq!(activity.verb, VERB_CREATED);
        assert_eq!(activity.target, ActivityTarget::Project);
        assert_eq!(activity.actor, owner);
    }

    #[test]
    fn member_added_notifies_the_invitee() {
        let owner = UserId::random();
        let invitee = UserId::random();
        let project = project(owner);

        let effects = member_added(&project, invitee, MemberRole::Member, owner);

        assert_eq!(effects.notifications.len(), 1);
        let n = &effects.notifications[0];
        assert_eq!(n.user, invitee);
        assert_eq!(n.kind, NotificationKind::ProjectInvite);
        assert_eq!(n.message, "You were added to project \"Alpha\"");
        assert_eq!(effects.activities.len(), 1);
        assert_eq!(effects.activities[0].verb, VERB_ADDED_MEMBER);
    }

    #[test]
    fn task_created_notifies_assignee_when_distinct_from_reporter() {
        let reporter = UserId::random();
        let assignee = UserId::random();
        let project = project(reporter);
        let task = task(&project, reporter, Some(assignee));

        let effects = task_created(&task, &project);

        assert_eq!(effects.activities.len(), 1);
        assert_eq!(effects.activities[0].target, ActivityTarget::Task);
        assert_eq!(effects.notifications.len(), 1);
        assert_eq!(effects.notifications[0].user, assignee);
        assert_eq!(effects.notifications[0].kind, NotificationKind::TaskAssigned);
    }

    #[test]
    fn task_created_skips_notification_for_self_assignment() {
        let reporter = UserId::random();
        let project = project(reporter);
        let task = task(&project, reporter, Some(reporter));

        let effects = task_created(&task, &project);

        assert!(effects.notifications.is_empty());
        assert_eq!(effects.activities.len(), 1);
    }

    #[test]
    fn task_created_without_assignee_derives_activity_only() {
        let reporter = UserId::random();
        let project = project(reporter);
        let effects = task_created(&task(&project, reporter, None), &project);

        assert!(effects.notifications.is_empty());
        assert_eq!(effects.activities.len(), 1);
    }

    #[test]
    fn status_change_records_history_and_notifies_assignee() {
        let reporter = UserId::random();
        let assignee = UserId::random();
        let project = project(reporter);
        let before = task(&project, reporter, Some(assignee));
        let mut after = before.clone();
        after.status = TaskStatus::Done;

        let effects = task_updated(&before, &after, &project, reporter);

        assert_eq!(effects.status_changes.len(), 1);
        let change = &effects.status_changes[0];
        assert_eq!(change.old_status, TaskStatus::Todo);
        assert_eq!(change.new_status, TaskStatus::Done);
        assert_eq!(change.changed_by, reporter);

        assert_eq!(effects.notifications.len(), 1);
        assert_eq!(effects.notifications[0].kind, NotificationKind::TaskUpdated);
        assert_eq!(effects.activities.len(), 1);
        assert_eq!(effects.activities[0].verb, VERB_UPDATED);
    }

    #[test]
    fn status_change_by_the_assignee_suppresses_the_notification() {
        let reporter = UserId::random();
        let assignee = UserId::random();
        let project = project(reporter);
        let before = task(&project, reporter, Some(assignee));
        let mut after = before.clone();
        after.status = TaskStatus::Done;

        let effects = task_updated(&before, &after, &project, assignee);

        assert!(effects.notifications.is_empty());
        assert_eq!(effects.status_changes.len(), 1);
        assert_eq!(effects.activities.len(), 1);
    }

    #[test]
    fn reassignment_notifies_new_assignee_unless_actor() {
        let reporter = UserId::random();
        let old_assignee = UserId::random();
        let new_assignee = UserId::random();
        let project = project(reporter);
        let before = task(&project, reporter, Some(old_assignee));
        let mut after = before.clone();
        after.assignee = Some(new_assignee);

        let effects = task_updated(&before, &after, &project, reporter);
        assert_eq!(effects.notifications.len(), 1);
        assert_eq!(effects.notifications[0].user, new_assignee);
        assert_eq!(effects.notifications[0].kind, NotificationKind::TaskAssigned);
        assert!(effects.activities.is_empty());
        assert!(effects.status_changes.is_empty());

        let effects = task_updated(&before, &after, &project, new_assignee);
        assert!(effects.is_empty());
    }

    #[test]
    fn clearing_the_assignee_derives_nothing() {
        let reporter = UserId::random();
        let project = project(reporter);
        let before = task(&project, reporter, Some(UserId::random()));
        let mut after = before.clone();
        after.assignee = None;

        assert!(task_updated(&before, &after, &project, reporter).is_empty());
    }

    #[test]
    fn update_without_status_or_assignee_change_derives_nothing() {
        let reporter = UserId::random();
        let project = project(reporter);
        let before = task(&project, reporter, None);
        let mut after = before.clone();
        after.title = "Fix bug properly".into();

        assert!(task_updated(&before, &after, &project, reporter).is_empty());
    }

    #[test]
    fn comment_on_assigned_task_notifies_the_assignee() {
        let author = UserId::random();
        let assignee = UserId::random();
        let project = project(author);
        let task = task(&project, author, Some(assignee));
        let comment = comment(&project, Some(&task), author);

        let effects = comment_created(&comment, Some(&task));

        assert_eq!(effects.activities.len(), 1);
        assert_eq!(effects.activities[0].verb, VERB_COMMENTED);
        assert_eq!(effects.notifications.len(), 1);
        let n = &effects.notifications[0];
        assert_eq!(n.user, assignee);
        assert_eq!(n.kind, NotificationKind::CommentAdded);
        assert_eq!(n.comment, Some(comment.id));
    }

    #[test]
    fn comment_by_the_assignee_derives_activity_only() {
        let assignee = UserId::random();
        let project = project(assignee);
        let task = task(&project, assignee, Some(assignee));
        let comment = comment(&project, Some(&task), assignee);

        let effects = comment_created(&comment, Some(&task));
        assert!(effects.notifications.is_empty());
        assert_eq!(effects.activities.len(), 1);
    }

    #[test]
    fn project_level_comment_derives_activity_only() {
        let author = UserId::random();
        let project = project(author);
        let comment = comment(&project, None, author);

        let effects = comment_created(&comment, None);
        assert!(effects.notifications.is_empty());
        assert_eq!(effects.activities.len(), 1);
    }

    #[test]
    fn meta_snippets_are_truncated_by_characters_not_bytes() {
        let author = UserId::random();
        let project = project(author);
        let mut comment = comment(&project, None, author);
        comment.body = "ü".repeat(200);

        let effects = comment_created(&comment, None);
        let body = effects.activities[0].meta["comment_body"]
            .as_str()
            .expect("string meta");
        assert_eq!(body.chars().count(), 100);
    }
}
