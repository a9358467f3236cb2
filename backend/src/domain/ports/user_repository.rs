//! Port for user identity lookup.

use async_trait::async_trait;

use crate::domain::ids::UserId;
use crate::domain::user::User;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// Read-only access to the identity store.
///
/// Users are created and mutated by the external identity service; the
/// collaboration core only resolves ids when validating assignees and
/// membership targets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id, or `None` when the id does not resolve.
    async fn find(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;
}
