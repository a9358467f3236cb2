//! Domain model and application services.
//!
//! Entities are plain data with their invariants documented per type. All
//! persistence flows through the trait ports in [`ports`]; the services own
//! the business rules: membership checks via [`authorization`], and the
//! derived notification/activity/history records via [`side_effects`].

pub mod activity;
pub mod attachment;
pub mod attachment_service;
pub mod authorization;
pub mod comment;
pub mod comment_service;
pub mod error;
pub mod ids;
pub mod inbox_service;
pub mod notification;
pub mod ports;
pub mod project;
pub mod project_service;
pub mod side_effects;
pub mod task;
pub mod task_service;
pub mod user;

pub use self::activity::{ActivityEntry, ActivityTarget};
pub use self::attachment::{Attachment, AttachmentOwner};
pub use self::attachment_service::AttachmentService;
pub use self::authorization::{AuthorizationGuard, ProjectAccess, ProjectScoped};
pub use self::comment::Comment;
pub use self::comment_service::{CommentService, NewComment};
pub use self::error::{Error, ErrorCode};
pub use self::ids::{
    ActivityId, AttachmentId, CommentId, NotificationId, ProjectId, TaskId, UserId,
};
pub use self::inbox_service::InboxService;
pub use self::notification::{Notification, NotificationKind};
pub use self::project::{MemberRole, Project, ProjectMembership};
pub use self::project_service::{ProjectChanges, ProjectService};
pub use self::side_effects::SideEffects;
pub use self::task::{Task, TaskPriority, TaskStatus, TaskStatusChange, WorkloadEntry};
pub use self::task_service::{NewTask, TaskChanges, TaskService};
pub use self::user::User;

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
