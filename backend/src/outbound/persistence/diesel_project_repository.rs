//! PostgreSQL-backed `ProjectRepository` implementation using Diesel ORM.
//!
//! Composite writes (project creation, membership upsert) run inside a
//! transaction so the primary row and the derived side-effect rows commit or
//! roll back together.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ids::{ProjectId, UserId};
use crate::domain::ports::{ProjectRepository, ProjectRepositoryError};
use crate::domain::project::{Project, ProjectMembership};
use crate::domain::side_effects::SideEffects;

use super::effects::insert_side_effects;
use super::models::{MembershipRow, ProjectRow};
use super::pool::{DbPool, PoolError};
use super::schema::{project_memberships, projects};

/// Diesel-backed implementation of the `ProjectRepository` port.
#[derive(Clone)]
pub struct DieselProjectRepository {
    pool: DbPool,
}

impl DieselProjectRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to the port's error type.
fn map_pool_error(error: PoolError) -> ProjectRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ProjectRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to the port's error type. Unique violations become
/// conflicts so the service layer can surface them as such.
fn map_diesel_error(error: diesel::result::Error) -> ProjectRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    super::diesel_helpers::log_diesel_error(&error);

    match error {
        DieselError::NotFound => ProjectRepositoryError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            ProjectRepositoryError::conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ProjectRepositoryError::connection("database connection error")
        }
        _ => ProjectRepositoryError::query("database error"),
    }
}

#[async_trait]
impl ProjectRepository for DieselProjectRepository {
    async fn create(
        &self,
        project: &Project,
        owner_membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<(), ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let project_row = ProjectRow::from(project);
        let membership_row = MembershipRow::from(owner_membership);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(projects::table)
                    .values(&project_row)
                    .execute(conn)
                    .await?;

                diesel::insert_into(project_memberships::table)
                    .values(&membership_row)
                    .execute(conn)
                    .await?;

                insert_side_effects(conn, effects).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find(&self, id: ProjectId) -> Result<Option<Project>, ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ProjectRow> = projects::table
            .find(id.as_uuid())
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Project::from))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Project>, ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let member_of = project_memberships::table
            .filter(project_memberships::user_id.eq(user.as_uuid()))
            .select(project_memberships::project_id);

        let rows: Vec<ProjectRow> = projects::table
            .filter(
                projects::owner_id
                    .eq(user.as_uuid())
                    .or(projects::id.eq_any(member_of)),
            )
            .select(ProjectRow::as_select())
            .order(projects::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn update(&self, project: &Project) -> Result<(), ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(projects::table.find(project.id.as_uuid()))
            .set((
                projects::name.eq(&project.name),
                projects::description.eq(&project.description),
                projects::is_archived.eq(project.is_archived),
                projects::updated_at.eq(project.updated_at),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: ProjectId) -> Result<(), ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Memberships, tasks, comments, and feeds cascade in the database.
        diesel::delete(projects::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) -> Result<Option<ProjectMembership>, ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<MembershipRow> = project_memberships::table
            .find((project.as_uuid(), user.as_uuid()))
            .select(MembershipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(ProjectMembership::from))
    }

    async fn list_members(
        &self,
        project: ProjectId,
    ) -> Result<Vec<ProjectMembership>, ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MembershipRow> = project_memberships::table
            .filter(project_memberships::project_id.eq(project.as_uuid()))
            .select(MembershipRow::as_select())
            .order(project_memberships::joined_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(ProjectMembership::from).collect())
    }

    async fn upsert_membership(
        &self,
        membership: &ProjectMembership,
        effects: &SideEffects,
    ) -> Result<ProjectMembership, ProjectRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = MembershipRow::from(membership);

        let stored: MembershipRow = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    // Last write wins on the role; the original joined_at is
                    // kept when the pair already exists.
                    let stored = diesel::insert_into(project_memberships::table)
                        .values(&row)
                        .on_conflict((
                            project_memberships::project_id,
                            project_memberships::user_id,
                        ))
                        .do_update()
                        .set(project_memberships::role.eq(excluded(project_memberships::role)))
                        .returning(MembershipRow::as_returning())
                        .get_result(conn)
                        .await?;

                    insert_side_effects(conn, effects).await?;
                    Ok(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(ProjectMembership::from(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(err, ProjectRepositoryError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let err = map_diesel_error(diesel::result::Error::NotFound);

        assert!(matches!(err, ProjectRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unique_violation_maps_to_conflict() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        ));

        assert!(matches!(err, ProjectRepositoryError::Conflict { .. }));
        assert!(err.to_string().contains("duplicate key value"));
    }
}
