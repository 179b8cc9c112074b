//! SQLite pool setup and schema bootstrap
//!
//! Opening a pool creates the database file (and its parent directory)
//! when missing, switches the journal to WAL so readers don't block on
//! the scan runner's writes, and applies the schema before handing the
//! pool out. An in-memory variant backs the test suites.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::StoreError;

/// SQLite connection pool behind every [`SqliteStore`](crate::SqliteStore)
///
/// File-backed pools run WAL with up to 5 connections and a 5-second
/// busy timeout. In-memory pools are pinned to a single connection,
/// since SQLite scopes `:memory:` databases per connection.
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if necessary) the database at `db_path`
    ///
    /// Missing parent directories are created first, then the schema is
    /// applied, so the caller gets a pool that is immediately usable.
    ///
    /// # Errors
    ///
    /// `StoreError::ConnectionFailed` when the file or directory cannot
    /// be opened, `StoreError::MigrationFailed` when the schema cannot
    /// be applied.
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!(
                    "Failed to connect to database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::info!(
            path = %db_path.display(),
            "Database pool initialized"
        );

        Ok(Self { pool })
    }

    /// Opens a throwaway in-memory database, schema applied
    ///
    /// Capped at one connection: a second connection would see an
    /// empty, unrelated `:memory:` database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        // No acquire-time ping: the single in-memory connection cannot go
        // stale, and the ping's round-trip deadlocks tests that pause time.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .test_before_acquire(false)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?;

        sqlx::raw_sql("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to enable foreign keys: {}", e))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory database pool initialized");

        Ok(Self { pool })
    }

    /// The underlying SQLx pool, for queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the bundled schema migration
    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        let migration_sql = include_str!("migrations/20260810_initial.sql");
        sqlx::raw_sql(migration_sql)
            .execute(pool)
            .await
            .map_err(|e| {
                StoreError::MigrationFailed(format!("Failed to run initial migration: {}", e))
            })?;

        tracing::debug!("Database migrations completed");
        Ok(())
    }
}
