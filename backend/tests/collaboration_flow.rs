//! End-to-end flows through the domain services over the in-memory store.
//!
//! These exercise the authorization guard and the side-effect pipeline
//! together: memberships gate every call, and notifications, activity
//! entries, and status history appear as a consequence of mutations.

use std::sync::Arc;

use chrono::Utc;

use synergysphere::domain::ports::MemoryStore;
use synergysphere::domain::{
    AttachmentOwner, AttachmentService, AuthorizationGuard, CommentService, ErrorCode,
    InboxService, MemberRole, NewComment, NewTask, ProjectService, TaskChanges, TaskService,
    TaskStatus, User, UserId,
};

struct Fixture {
    projects: ProjectService,
    tasks: TaskService,
    comments: CommentService,
    inbox: InboxService,
    attachments: AttachmentService,
    owner: UserId,
    member: UserId,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let owner = UserId::random();
    let member = UserId::random();
    for (id, name) in [(owner, "ada"), (member, "brian")] {
        store.add_user(User {
            id,
            username: name.into(),
            email: format!("{name}@example.com"),
            full_name: name.into(),
            avatar_url: None,
            created_at: Utc::now(),
        });
    }

    let guard = Arc::new(AuthorizationGuard::new(store.clone()));
    Fixture {
        projects: ProjectService::new(store.clone(), store.clone(), guard.clone()),
        tasks: TaskService::new(store.clone(), store.clone(), guard.clone()),
        comments: CommentService::new(store.clone(), store.clone(), guard.clone()),
        inbox: InboxService::new(store.clone(), store.clone(), guard.clone()),
        attachments: AttachmentService::new(store.clone(), store.clone(), store.clone(), guard),
        owner,
        member,
    }
}

fn new_task(fx: &Fixture, project: synergysphere::domain::ProjectId, title: &str) -> NewTask {
    NewTask {
        project,
        title: title.into(),
        description: String::new(),
        status: None,
        priority: None,
        assignee: Some(fx.member),
        due_date: None,
        order: None,
    }
}

#[tokio::test]
async fn project_creation_grants_admin_membership_and_logs_activity() {
    let fx = fixture();

    let project = fx
        .projects
        .create(fx.owner, "Alpha", "first project")
        .await
        .expect("create project");

    let members = fx
        .projects
        .members(fx.owner, project.id)
        .await
        .expect("members");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user, fx.owner);
    assert_eq!(members[0].role, MemberRole::Admin);

    let feed = fx
        .inbox
        .activity(fx.owner, project.id)
        .await
        .expect("activity");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].verb, "created");
}

#[tokio::test]
async fn adding_a_member_notifies_them_on_every_call() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");

    fx.projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Member)
        .await
        .expect("add member");

    // Re-adding changes the role in place and notifies again.
    let membership = fx
        .projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Viewer)
        .await
        .expect("re-add member");
    assert_eq!(membership.role, MemberRole::Viewer);

    let members = fx
        .projects
        .members(fx.owner, project.id)
        .await
        .expect("members");
    assert_eq!(members.len(), 2);

    let inbox = fx.inbox.notifications(fx.member).await.expect("inbox");
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].message, "You were added to project \"Alpha\"");
}

#[tokio::test]
async fn non_members_are_turned_away_and_unknown_projects_stay_hidden() {
    let fx = fixture();
    let outsider = UserId::random();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");

    let err = fx
        .projects
        .get(outsider, project.id)
        .await
        .expect_err("outsider");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = fx
        .projects
        .get(fx.owner, synergysphere::domain::ProjectId::random())
        .await
        .expect_err("unknown project");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn assignment_and_status_changes_reach_the_assignee() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");
    fx.projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Member)
        .await
        .expect("add member");

    let task = fx
        .tasks
        .create(fx.owner, new_task(&fx, project.id, "Fix login"))
        .await
        .expect("create task");

    // Flip to in-progress and back: two history rows, oldest first.
    for status in [TaskStatus::InProgress, TaskStatus::Todo] {
        fx.tasks
            .update(
                fx.owner,
                task.id,
                TaskChanges {
                    status: Some(status),
                    ..TaskChanges::default()
                },
            )
            .await
            .expect("update status");
    }

    let history = fx
        .tasks
        .status_history(fx.owner, task.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].old_status, TaskStatus::Todo);
    assert_eq!(history[0].new_status, TaskStatus::InProgress);
    assert_eq!(history[1].new_status, TaskStatus::Todo);

    let inbox = fx.inbox.notifications(fx.member).await.expect("inbox");
    let messages: Vec<&str> = inbox.iter().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"You were assigned task \"Fix login\" in project \"Alpha\""));
    assert!(messages.contains(&"Task \"Fix login\" status changed to In Progress"));
}

#[tokio::test]
async fn updates_without_a_status_change_leave_history_untouched() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");
    fx.projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Member)
        .await
        .expect("add member");
    let task = fx
        .tasks
        .create(fx.owner, new_task(&fx, project.id, "Fix login"))
        .await
        .expect("create task");

    fx.tasks
        .update(
            fx.owner,
            task.id,
            TaskChanges {
                title: Some("Fix login flow".into()),
                ..TaskChanges::default()
            },
        )
        .await
        .expect("rename");

    let history = fx
        .tasks
        .status_history(fx.owner, task.id)
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn workload_counts_open_tasks_per_assignee() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");
    fx.projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Member)
        .await
        .expect("add member");

    for title in ["One", "Two"] {
        fx.tasks
            .create(fx.owner, new_task(&fx, project.id, title))
            .await
            .expect("create task");
    }
    let done = fx
        .tasks
        .create(fx.owner, new_task(&fx, project.id, "Three"))
        .await
        .expect("create task");
    fx.tasks
        .update(
            fx.owner,
            done.id,
            TaskChanges {
                status: Some(TaskStatus::Done),
                ..TaskChanges::default()
            },
        )
        .await
        .expect("finish task");

    // Unassigned tasks never appear in the aggregate.
    fx.tasks
        .create(
            fx.owner,
            NewTask {
                assignee: None,
                ..new_task(&fx, project.id, "Backlog")
            },
        )
        .await
        .expect("create task");

    let workload = fx
        .tasks
        .workload(fx.owner, project.id)
        .await
        .expect("workload");
    assert_eq!(workload.len(), 1);
    assert_eq!(workload[0].assignee, fx.member);
    assert_eq!(workload[0].open_tasks, 2);
}

#[tokio::test]
async fn comments_notify_the_assignee_and_mark_all_read_is_idempotent() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");
    fx.projects
        .add_member(fx.owner, project.id, fx.member, MemberRole::Member)
        .await
        .expect("add member");
    let task = fx
        .tasks
        .create(fx.owner, new_task(&fx, project.id, "Fix login"))
        .await
        .expect("create task");

    fx.comments
        .create(
            fx.owner,
            NewComment {
                project: project.id,
                task: Some(task.id),
                parent: None,
                body: "looking into it".into(),
            },
        )
        .await
        .expect("comment");

    let inbox = fx.inbox.notifications(fx.member).await.expect("inbox");
    assert!(
        inbox
            .iter()
            .any(|n| n.message == "New comment on task \"Fix login\"")
    );
    assert!(inbox.iter().all(|n| !n.is_read));

    let updated = fx.inbox.mark_all_read(fx.member).await.expect("mark read");
    assert_eq!(updated, inbox.len() as u64);
    assert_eq!(fx.inbox.mark_all_read(fx.member).await.expect("again"), 0);
}

#[tokio::test]
async fn attachments_follow_their_owner_scope() {
    let fx = fixture();
    let project = fx
        .projects
        .create(fx.owner, "Alpha", "")
        .await
        .expect("create project");
    let task = fx
        .tasks
        .create(
            fx.owner,
            NewTask {
                assignee: None,
                ..new_task(&fx, project.id, "Fix login")
            },
        )
        .await
        .expect("create task");

    let attachment = fx
        .attachments
        .create(fx.owner, AttachmentOwner::Task(task.id), "uploads/log.txt")
        .await
        .expect("attach");

    let listed = fx
        .attachments
        .list(fx.owner, AttachmentOwner::Task(task.id))
        .await
        .expect("list");
    assert_eq!(listed, vec![attachment]);

    let outsider = UserId::random();
    let err = fx
        .attachments
        .list(outsider, AttachmentOwner::Task(task.id))
        .await
        .expect_err("outsider");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
