//! PostgreSQL-backed `ActivityRepository` implementation using Diesel ORM.
//!
//! Read only. Activity rows are inserted by the side-effect pipeline through
//! the other repositories' composite writes.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::activity::ActivityEntry;
use crate::domain::ids::ProjectId;
use crate::domain::ports::{ActivityRepository, ActivityRepositoryError};

use super::diesel_helpers::define_error_mapping;
use super::models::ActivityRow;
use super::pool::DbPool;
use super::schema::activity_log;

define_error_mapping!(ActivityRepositoryError);

/// Diesel-backed implementation of the `ActivityRepository` port.
#[derive(Clone)]
pub struct DieselActivityRepository {
    pool: DbPool,
}

impl DieselActivityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for DieselActivityRepository {
    async fn list_for_project(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ActivityEntry>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ActivityRow> = activity_log::table
            .filter(activity_log::project_id.eq(project.as_uuid()))
            .select(ActivityRow::as_select())
            .order(activity_log::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(ActivityEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::pool::PoolError;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("pool exhausted"));

        assert!(matches!(err, ActivityRepositoryError::Connection { .. }));
    }
}
