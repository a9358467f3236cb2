//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::comment::Comment;
use crate::domain::ids::CommentId;
use crate::domain::ports::{CommentFilter, CommentRepository, CommentRepositoryError};
use crate::domain::side_effects::SideEffects;

use super::diesel_helpers::define_error_mapping;
use super::effects::insert_side_effects;
use super::models::CommentRow;
use super::pool::DbPool;
use super::schema::comments;

define_error_mapping!(CommentRepositoryError);

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn create(
        &self,
        comment: &Comment,
        effects: &SideEffects,
    ) -> Result<(), CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = CommentRow::from(comment);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(comments::table)
                    .values(&row)
                    .execute(conn)
                    .await?;

                insert_side_effects(conn, effects).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find(&self, id: CommentId) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CommentRow> = comments::table
            .find(id.as_uuid())
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Comment::from))
    }

    async fn list(&self, filter: CommentFilter) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = comments::table
            .filter(comments::project_id.eq(filter.project.as_uuid()))
            .select(CommentRow::as_select())
            .into_boxed();

        if let Some(task) = filter.task {
            query = query.filter(comments::task_id.eq(*task.as_uuid()));
        }

        let rows: Vec<CommentRow> = query
            .order(comments::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn delete(&self, id: CommentId) -> Result<(), CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Replies cascade through the parent_id foreign key.
        diesel::delete(comments::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
