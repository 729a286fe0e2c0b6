//! SQLite-based store using `SeaORM`.
//!
//! `SqliteStore` implements `DomainRecordRepository` against a local `SQLite`
//! database. Optimistic concurrency relies on a versioned `UPDATE`, and the
//! one-active-record-per-domain rule on a partial unique index.

mod domain_record_repo;
pub(crate) mod entity;
mod migration;

use std::path::Path;

use domain_verifier_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-based domain record store for the daemon and CLI tools.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run pending migrations.
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        log::info!("Opened domain record store at {}", db_path.display());
        Ok(store)
    }
}
