//! Repository ports the domain depends on.
//!
//! Each port is an async trait implemented by a persistence adapter in
//! `outbound::persistence` and by the in-memory [`MemoryStore`] fixture.
//! Composite writes take a [`crate::domain::side_effects::SideEffects`]
//! value and must persist the primary row and every derived row in one
//! transaction.

mod macros;
pub mod memory;

pub mod activity_repository;
pub mod attachment_repository;
pub mod comment_repository;
pub mod notification_repository;
pub mod project_repository;
pub mod task_repository;
pub mod user_repository;

pub use activity_repository::{ActivityRepository, ActivityRepositoryError};
pub use attachment_repository::{AttachmentRepository, AttachmentRepositoryError};
pub use comment_repository::{CommentFilter, CommentRepository, CommentRepositoryError};
pub use memory::MemoryStore;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
pub use project_repository::{ProjectRepository, ProjectRepositoryError};
pub use task_repository::{TaskFilter, TaskRepository, TaskRepositoryError};
pub use user_repository::{UserRepository, UserRepositoryError};

#[cfg(test)]
pub use activity_repository::MockActivityRepository;
#[cfg(test)]
pub use attachment_repository::MockAttachmentRepository;
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
#[cfg(test)]
pub use project_repository::MockProjectRepository;
#[cfg(test)]
pub use task_repository::MockTaskRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
