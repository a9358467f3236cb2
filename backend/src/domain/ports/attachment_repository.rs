//! Port for attachment metadata records.

use async_trait::async_trait;

use crate::domain::attachment::{Attachment, AttachmentOwner};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by attachment repository adapters.
    pub enum AttachmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "attachment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "attachment repository query failed: {message}",
    }
}

/// Persistence for file references. The binary payload itself lives in the
/// external file store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Persist a new attachment record.
    async fn create(&self, attachment: &Attachment) -> Result<(), AttachmentRepositoryError>;

    /// List the attachments of one owning entity, newest first.
    async fn list_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, AttachmentRepositoryError>;
}
