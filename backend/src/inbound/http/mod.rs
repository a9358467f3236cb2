//! HTTP inbound adapter exposing the REST endpoints.

pub mod activity;
pub mod attachments;
pub mod auth;
pub mod comments;
pub mod error;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod state;
pub mod tasks;
pub mod validation;

use actix_web::web;

pub use error::{ApiResult, TRACE_ID_HEADER};

/// Register every `/api/v1` endpoint.
///
/// Literal segments such as `/tasks/workload` are registered before their
/// parameterised siblings so the route match resolves them first.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(projects::create)
            .service(projects::list)
            .service(projects::get_one)
            .service(projects::update)
            .service(projects::remove)
            .service(projects::add_member)
            .service(projects::members)
            .service(tasks::create)
            .service(tasks::list)
            .service(tasks::workload)
            .service(tasks::get_one)
            .service(tasks::update)
            .service(tasks::remove)
            .service(tasks::watch)
            .service(tasks::history)
            .service(comments::create)
            .service(comments::list)
            .service(comments::get_one)
            .service(comments::remove)
            .service(notifications::list)
            .service(notifications::mark_all_read)
            .service(activity::list)
            .service(attachments::create)
            .service(attachments::list),
    );
}
