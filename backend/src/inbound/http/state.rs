//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on the domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{
    AttachmentService, CommentService, InboxService, ProjectService, TaskService,
};

use super::auth::JwtVerifier;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub verifier: Arc<JwtVerifier>,
    pub projects: Arc<ProjectService>,
    pub tasks: Arc<TaskService>,
    pub comments: Arc<CommentService>,
    pub inbox: Arc<InboxService>,
    pub attachments: Arc<AttachmentService>,
}
