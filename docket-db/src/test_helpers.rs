//! Helpers for tests that need a database.

use sqlx::sqlite::SqlitePoolOptions;

use crate::db::DbPool;
use crate::error::DbResult;

/// Create an in-memory database with the full schema applied.
pub async fn create_test_pool() -> DbResult<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    DbPool::run_migrations(&pool).await?;

    Ok(DbPool::from_pool(pool))
}
