//! PostgreSQL-backed `TaskRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ids::{ProjectId, TaskId, UserId};
use crate::domain::ports::{TaskFilter, TaskRepository, TaskRepositoryError};
use crate::domain::side_effects::SideEffects;
use crate::domain::task::{Task, TaskStatus, TaskStatusChange, WorkloadEntry};

use super::diesel_helpers::define_error_mapping;
use super::effects::insert_side_effects;
use super::models::{StatusChangeRow, TaskRow};
use super::pool::DbPool;
use super::schema::{task_status_history, task_watchers, tasks};

define_error_mapping!(TaskRepositoryError);

/// Diesel-backed implementation of the `TaskRepository` port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn create(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = TaskRow::from(task);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(tasks::table)
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

    async fn find(&self, id: TaskId) -> Result<Option<Task>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TaskRow> = tasks::table
            .find(id.as_uuid())
            .select(TaskRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Task::from))
    }

    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = tasks::table
            .filter(tasks::project_id.eq(filter.project.as_uuid()))
            .select(TaskRow::as_select())
            .into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(tasks::status.eq(status.as_str()));
        }

        let rows: Vec<TaskRow> = query
            .order((tasks::ordering.asc(), tasks::created_at.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update(&self, task: &Task, effects: &SideEffects) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::update(tasks::table.find(task.id.as_uuid()))
                    .set((
                        tasks::title.eq(&task.title),
                        tasks::description.eq(&task.description),
                        tasks::status.eq(task.status.as_str()),
                        tasks::priority.eq(task.priority.as_str()),
                        tasks::assignee_id.eq(task.assignee.map(|id| *id.as_uuid())),
                        tasks::due_date.eq(task.due_date),
                        tasks::ordering.eq(task.order),
                        tasks::updated_at.eq(task.updated_at),
                    ))
                    .execute(conn)
                    .await?;

                insert_side_effects(conn, effects).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: TaskId) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Watchers, history, and task comments cascade in the database.
        diesel::delete(tasks::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn add_watcher(&self, task: TaskId, user: UserId) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(task_watchers::table)
            .values((
                task_watchers::task_id.eq(task.as_uuid()),
                task_watchers::user_id.eq(user.as_uuid()),
            ))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn status_history(
        &self,
        task: TaskId,
    ) -> Result<Vec<TaskStatusChange>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StatusChangeRow> = task_status_history::table
            .filter(task_status_history::task_id.eq(task.as_uuid()))
            .select(StatusChangeRow::as_select())
            .order(task_status_history::changed_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(TaskStatusChange::from).collect())
    }

    async fn workload(
        &self,
        project: ProjectId,
    ) -> Result<Vec<WorkloadEntry>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Uuid, i64)> = tasks::table
            .filter(tasks::project_id.eq(project.as_uuid()))
            .filter(tasks::assignee_id.is_not_null())
            .filter(tasks::status.ne(TaskStatus::Done.as_str()))
            .group_by(tasks::assignee_id)
            .select((tasks::assignee_id.assume_not_null(), diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut entries: Vec<WorkloadEntry> = rows
            .into_iter()
            .map(|(assignee, open_tasks)| WorkloadEntry {
                assignee: UserId::from_uuid(assignee),
                open_tasks,
            })
            .collect();
        entries.sort_by(|a, b| b.open_tasks.cmp(&a.open_tasks));

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::persistence::pool::PoolError;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(err, TaskRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("connection closed".to_owned()),
        ));

        assert!(matches!(err, TaskRepositoryError::Connection { .. }));
    }
}
