//! Embedded schema migrations.
//!
//! Migrations are compiled into the binary and applied at startup before the
//! server begins accepting traffic. The migration harness is synchronous, so
//! it runs on a blocking thread with its own short-lived connection.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tokio::task;
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Could not open a connection to the database.
    #[error("failed to connect for migrations: {0}")]
    Connection(String),

    /// A migration failed to apply.
    #[error("failed to run migrations: {0}")]
    Migration(String),

    /// The blocking task running the harness was cancelled.
    #[error("migration task failed: {0}")]
    Join(String),
}

/// Apply any pending migrations against the given database.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let database_url = database_url.to_owned();

    task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|err| MigrationError::Connection(err.to_string()))?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Migration(err.to_string()))?;

        for version in &applied {
            info!(%version, "applied migration");
        }
        Ok(())
    })
    .await
    .map_err(|err| MigrationError::Join(err.to_string()))?
}
