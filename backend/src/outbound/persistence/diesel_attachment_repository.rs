//! PostgreSQL-backed `AttachmentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::attachment::{Attachment, AttachmentOwner};
use crate::domain::ports::{AttachmentRepository, AttachmentRepositoryError};

use super::diesel_helpers::define_error_mapping;
use super::models::AttachmentRow;
use super::pool::DbPool;
use super::schema::attachments;

define_error_mapping!(AttachmentRepositoryError);

/// Diesel-backed implementation of the `AttachmentRepository` port.
#[derive(Clone)]
pub struct DieselAttachmentRepository {
    pool: DbPool,
}

impl DieselAttachmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for DieselAttachmentRepository {
    async fn create(&self, attachment: &Attachment) -> Result<(), AttachmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = AttachmentRow::from(attachment);

        diesel::insert_into(attachments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, AttachmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (owner_type, owner_id) = AttachmentRow::owner_parts(owner);

        let rows: Vec<AttachmentRow> = attachments::table
            .filter(attachments::owner_type.eq(owner_type))
            .filter(attachments::owner_id.eq(owner_id))
            .select(AttachmentRow::as_select())
            .order(attachments::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }
}
