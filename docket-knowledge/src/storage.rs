//! Persistent chunk store: sqlite with the sqlite-vec extension.
//!
//! Chunks live in a plain `doc_chunks` table; their embeddings live in a
//! `chunk_vec` vec0 virtual table keyed by chunk rowid. The vec0 table is
//! created lazily once the embedding dimension is known (from settings or
//! from the first embedding batch) and the dimension is pinned in `meta`.

use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use libsqlite3_sys::{SQLITE_OK, sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::errors::{IndexError, IndexResult};

static SQLITE_VEC_INIT_RC: OnceLock<i32> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct ChunkStore {
    pool: SqlitePool,
}

impl ChunkStore {
    pub async fn open(db_path: &Path, embedding_dim: Option<usize>) -> IndexResult<Self> {
        init_sqlite_vec_once()?;
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous = NORMAL")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        if let Some(dim) = stored_or_configured_dim(&pool, embedding_dim).await? {
            ensure_vec_table_dim(&pool, dim).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn init_sqlite_vec_once() -> IndexResult<()> {
    let rc = *SQLITE_VEC_INIT_RC.get_or_init(|| unsafe {
        type SqliteVecInitFn =
            unsafe extern "C" fn(*mut sqlite3, *mut *const i8, *const sqlite3_api_routines) -> i32;

        sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteVecInitFn>(
            sqlite3_vec_init as *const (),
        )))
    });

    if rc == SQLITE_OK {
        Ok(())
    } else {
        Err(IndexError::SqliteVec(format!(
            "sqlite-vec init failed with code {rc}"
        )))
    }
}

async fn run_migrations(pool: &SqlitePool) -> IndexResult<()> {
    let migration_sql = include_str!("../migrations/001_chunk_store.sql");
    for statement in migration_sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt).execute(pool).await?;
        }
    }
    Ok(())
}

async fn stored_or_configured_dim(
    pool: &SqlitePool,
    configured: Option<usize>,
) -> IndexResult<Option<usize>> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM meta WHERE key = 'embedding_dim' LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(existing
        .and_then(|(value,)| value.parse::<usize>().ok())
        .or(configured))
}

/// Create the vec0 table for the given dimension if absent and pin the
/// dimension in `meta`.
pub async fn ensure_vec_table_dim(pool: &SqlitePool, dimension: usize) -> IndexResult<()> {
    let table_exists: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
    )
    .fetch_optional(pool)
    .await?;

    if table_exists.is_none() {
        let create_sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS chunk_vec USING vec0(embedding float[{}])",
            dimension
        );
        sqlx::query(&create_sql).execute(pool).await?;
    }

    sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('embedding_dim', ?)")
        .bind(dimension.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert one chunk row, returning its rowid.
pub async fn insert_chunk(
    pool: &SqlitePool,
    filename: &str,
    chunk_index: i64,
    content: &str,
) -> IndexResult<i64> {
    let result = sqlx::query(
        "INSERT INTO doc_chunks (filename, chunk_index, content, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(filename)
    .bind(chunk_index)
    .bind(content)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Store a chunk's embedding.
pub async fn upsert_vec(pool: &SqlitePool, chunk_id: i64, embedding: &[f32]) -> IndexResult<()> {
    let payload = serde_json::to_string(embedding)
        .map_err(|e| IndexError::Embedding(format!("embedding serialize failed: {e}")))?;

    sqlx::query("INSERT OR REPLACE INTO chunk_vec(rowid, embedding) VALUES (?, ?)")
        .bind(chunk_id)
        .bind(payload)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every chunk (and its vector) tagged with the filename.
/// Returns the number of chunks removed; zero matches is not an error.
pub async fn delete_chunks(pool: &SqlitePool, filename: &str) -> IndexResult<u64> {
    let existing_ids: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM doc_chunks WHERE filename = ?")
            .bind(filename)
            .fetch_all(pool)
            .await?;

    if existing_ids.is_empty() {
        return Ok(0);
    }

    let vec_table_exists: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
    )
    .fetch_optional(pool)
    .await?;

    if vec_table_exists.is_some() {
        let placeholders = existing_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("DELETE FROM chunk_vec WHERE rowid IN ({})", placeholders);
        let mut query = sqlx::query(&sql);
        for (chunk_id,) in &existing_ids {
            query = query.bind(chunk_id);
        }
        query.execute(pool).await?;
    }

    let result = sqlx::query("DELETE FROM doc_chunks WHERE filename = ?")
        .bind(filename)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Total number of chunks in the store.
pub async fn count_chunks(pool: &SqlitePool) -> IndexResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM doc_chunks")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of chunks tagged with a specific filename.
pub async fn count_chunks_for(pool: &SqlitePool, filename: &str) -> IndexResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM doc_chunks WHERE filename = ?")
            .bind(filename)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// K-nearest-neighbor search over the vec0 table, hydrated with chunk rows.
/// Returns `(filename, chunk_index, content, distance)` ordered nearest first.
pub async fn search_vec(
    pool: &SqlitePool,
    embedding: &[f32],
    k: usize,
) -> IndexResult<Vec<(String, i64, String, f32)>> {
    let vec_table_exists: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'chunk_vec'",
    )
    .fetch_optional(pool)
    .await?;
    if vec_table_exists.is_none() {
        return Ok(Vec::new());
    }

    let payload = serde_json::to_string(embedding)
        .map_err(|e| IndexError::Embedding(format!("embedding serialize failed: {e}")))?;

    let rows = sqlx::query_as::<_, (String, i64, String, f32)>(
        r#"SELECT c.filename, c.chunk_index, c.content, v.distance
           FROM chunk_vec v
           JOIN doc_chunks c ON c.id = v.rowid
           WHERE v.embedding MATCH ?
           ORDER BY v.distance ASC
           LIMIT ?"#,
    )
    .bind(payload)
    .bind(k as i64)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
