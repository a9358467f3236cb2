//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel, with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! The adapters are thin: they translate between Diesel row structs and
//! domain types, and map database failures onto the port error types. No
//! business logic lives here. Composite writes run the primary insert and
//! the derived side-effect rows in one transaction.
//!
//! Row structs (`models.rs`) and schema definitions (`schema.rs`) are
//! internal implementation details, never exposed to the domain layer.

pub(crate) mod diesel_helpers;
mod diesel_activity_repository;
mod diesel_attachment_repository;
mod diesel_comment_repository;
mod diesel_notification_repository;
mod diesel_project_repository;
mod diesel_task_repository;
mod diesel_user_repository;
mod effects;
mod migrate;
mod models;
mod pool;
mod schema;

pub use diesel_activity_repository::DieselActivityRepository;
pub use diesel_attachment_repository::DieselAttachmentRepository;
pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_project_repository::DieselProjectRepository;
pub use diesel_task_repository::DieselTaskRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrate::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
