//! Builders wiring domain services to repository adapters.
//!
//! When a database pool is configured the services run against the Diesel
//! adapters; otherwise they share one in-memory store seeded with a demo
//! user, which keeps local development and tests free of infrastructure.

use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{
    ActivityRepository, AttachmentRepository, CommentRepository, MemoryStore,
    NotificationRepository, ProjectRepository, TaskRepository, UserRepository,
};
use crate::domain::{
    AttachmentService, AuthorizationGuard, CommentService, InboxService, ProjectService,
    TaskService, User, UserId,
};
use crate::inbound::http::auth::JwtVerifier;
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::{
    DbPool, DieselActivityRepository, DieselAttachmentRepository, DieselCommentRepository,
    DieselNotificationRepository, DieselProjectRepository, DieselTaskRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// Id of the user seeded into the fixture store. Mint a token for this id to
/// exercise the API without a database.
pub const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

struct Repositories {
    users: Arc<dyn UserRepository>,
    projects: Arc<dyn ProjectRepository>,
    tasks: Arc<dyn TaskRepository>,
    comments: Arc<dyn CommentRepository>,
    notifications: Arc<dyn NotificationRepository>,
    activity: Arc<dyn ActivityRepository>,
    attachments: Arc<dyn AttachmentRepository>,
}

fn diesel_repositories(pool: &DbPool) -> Repositories {
    Repositories {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        projects: Arc::new(DieselProjectRepository::new(pool.clone())),
        tasks: Arc::new(DieselTaskRepository::new(pool.clone())),
        comments: Arc::new(DieselCommentRepository::new(pool.clone())),
        notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
        activity: Arc::new(DieselActivityRepository::new(pool.clone())),
        attachments: Arc::new(DieselAttachmentRepository::new(pool.clone())),
    }
}

fn fixture_repositories() -> Repositories {
    warn!("no database configured, serving from the in-memory fixture store");

    let store = MemoryStore::new();
    store.add_user(User {
        id: UserId::from_uuid(Uuid::parse_str(FIXTURE_USER_ID).unwrap_or_default()),
        username: "demo".into(),
        email: "demo@example.com".into(),
        full_name: "Demo User".into(),
        avatar_url: None,
        created_at: Utc::now(),
    });

    Repositories {
        users: Arc::new(store.clone()),
        projects: Arc::new(store.clone()),
        tasks: Arc::new(store.clone()),
        comments: Arc::new(store.clone()),
        notifications: Arc::new(store.clone()),
        activity: Arc::new(store.clone()),
        attachments: Arc::new(store),
    }
}

/// Build the shared HTTP state from the configured backing store.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let repos = match &config.db_pool {
        Some(pool) => diesel_repositories(pool),
        None => fixture_repositories(),
    };

    let guard = Arc::new(AuthorizationGuard::new(Arc::clone(&repos.projects)));

    web::Data::new(HttpState {
        verifier: Arc::new(JwtVerifier::new(&config.jwt_secret)),
        projects: Arc::new(ProjectService::new(
            Arc::clone(&repos.projects),
            Arc::clone(&repos.users),
            Arc::clone(&guard),
        )),
        tasks: Arc::new(TaskService::new(
            Arc::clone(&repos.tasks),
            Arc::clone(&repos.users),
            Arc::clone(&guard),
        )),
        comments: Arc::new(CommentService::new(
            Arc::clone(&repos.comments),
            Arc::clone(&repos.tasks),
            Arc::clone(&guard),
        )),
        inbox: Arc::new(InboxService::new(
            Arc::clone(&repos.notifications),
            Arc::clone(&repos.activity),
            Arc::clone(&guard),
        )),
        attachments: Arc::new(AttachmentService::new(
            Arc::clone(&repos.attachments),
            Arc::clone(&repos.tasks),
            Arc::clone(&repos.comments),
            guard,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ProjectId;

    #[tokio::test]
    async fn fixture_store_seeds_the_demo_user() {
        let repos = fixture_repositories();
        let id = UserId::from_uuid(Uuid::parse_str(FIXTURE_USER_ID).expect("fixture id"));

        let user = repos.users.find(id).await.expect("lookup");
        assert_eq!(user.expect("seeded").username, "demo");
    }

    #[tokio::test]
    async fn fixture_store_starts_with_no_projects() {
        let repos = fixture_repositories();

        let found = repos
            .projects
            .find(ProjectId::random())
            .await
            .expect("lookup");
        assert!(found.is_none());
    }
}
