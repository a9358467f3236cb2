//! Notification inbox and project activity feeds.

use std::sync::Arc;

use super::activity::ActivityEntry;
use super::authorization::AuthorizationGuard;
use super::error::Error;
use super::ids::{ProjectId, UserId};
use super::notification::Notification;
use super::ports::{
    ActivityRepository, ActivityRepositoryError, NotificationRepository,
    NotificationRepositoryError,
};

/// Application service for the read side of the side-effect pipeline.
pub struct InboxService {
    notifications: Arc<dyn NotificationRepository>,
    activity: Arc<dyn ActivityRepository>,
    guard: Arc<AuthorizationGuard>,
}

impl InboxService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        activity: Arc<dyn ActivityRepository>,
        guard: Arc<AuthorizationGuard>,
    ) -> Self {
        Self {
            notifications,
            activity,
            guard,
        }
    }

    /// The actor's notifications, newest first. Scoped to the actor alone;
    /// no parameter can widen it to another inbox.
    pub async fn notifications(&self, actor: UserId) -> Result<Vec<Notification>, Error> {
        self.notifications
            .list_for_user(actor)
            .await
            .map_err(notification_error)
    }

    /// Mark every unread notification of the actor as read. Returns the
    /// number of notifications flipped.
    pub async fn mark_all_read(&self, actor: UserId) -> Result<u64, Error> {
        self.notifications
            .mark_all_read(actor)
            .await
            .map_err(notification_error)
    }

    /// A project's activity feed, newest first. Any member may read it.
    pub async fn activity(
        &self,
        actor: UserId,
        project: ProjectId,
    ) -> Result<Vec<ActivityEntry>, Error> {
        self.guard.require_member(project, actor).await?;
        self.activity
            .list_for_project(project)
            .await
            .map_err(activity_error)
    }
}

fn notification_error(err: NotificationRepositoryError) -> Error {
    match &err {
        NotificationRepositoryError::Connection { .. } => {
            Error::service_unavailable(err.to_string())
        }
        NotificationRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

fn activity_error(err: ActivityRepositoryError) -> Error {
    match &err {
        ActivityRepositoryError::Connection { .. } => Error::service_unavailable(err.to_string()),
        ActivityRepositoryError::Query { .. } => Error::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MemoryStore, ProjectRepository};
    use crate::domain::project::{MemberRole, Project, ProjectMembership};
    use crate::domain::side_effects;

    fn service(store: &MemoryStore) -> InboxService {
        let projects: Arc<dyn ProjectRepository> = Arc::new(store.clone());
        let guard = Arc::new(AuthorizationGuard::new(projects));
        InboxService::new(Arc::new(store.clone()), Arc::new(store.clone()), guard)
    }

    #[tokio::test]
    async fn activity_feed_is_members_only() {
        let store = MemoryStore::new();
        let service = service(&store);
        let owner = UserId::random();
        let project = Project::create("Alpha", "", owner);
        let membership = ProjectMembership::grant(project.id, owner, MemberRole::Admin);
        ProjectRepository::create(
            &store,
            &project,
            &membership,
            &side_effects::project_created(&project),
        )
        .await
        .expect("seed");

        let feed = service.activity(owner, project.id).await.expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].verb, side_effects::VERB_CREATED);

        let err = service
            .activity(UserId::random(), project.id)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn empty_inbox_reads_as_an_empty_list() {
        let store = MemoryStore::new();
        let service = service(&store);

        let inbox = service
            .notifications(UserId::random())
            .await
            .expect("inbox");
        assert!(inbox.is_empty());
        assert_eq!(
            service.mark_all_read(UserId::random()).await.expect("ack"),
            0
        );
    }
}
