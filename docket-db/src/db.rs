//! Database connection pool and initialization.

use std::path::{Path, PathBuf};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::info;

use crate::error::{DbError, DbResult};

/// Database pool wrapper
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Initialize the database at the default data-directory path.
    pub async fn new() -> DbResult<Self> {
        let db_path = Self::db_path()?;
        Self::open(&db_path).await
    }

    /// Initialize the database at a specific path, running migrations.
    pub async fn open(db_path: &Path) -> DbResult<Self> {
        info!("Initializing database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // WAL mode for better concurrent read performance
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        Self::run_migrations(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// Get the inner SQLx pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path
    pub fn db_path() -> DbResult<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(DbError::NoConfigDir)?;
        Ok(data_dir.join("docket").join("docket.sqlite3"))
    }

    /// Run database migrations
    pub(crate) async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        let migration_sql = include_str!("../migrations/001_initial_schema.sql");

        for statement in migration_sql.split(";") {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(pool).await.map_err(|e| {
                    DbError::Migration(format!("Failed to execute migration: {}", e))
                })?;
            }
        }

        Ok(())
    }

    /// Close the pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(any(test, feature = "test-helpers"))]
    pub(crate) fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
