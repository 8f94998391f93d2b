//! Metadata bookkeeping for documents held in the vector index.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Metadata for one ingested document. The chunks and vectors themselves
/// live in the docket-knowledge chunk store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexedDocument {
    pub id: i64,
    pub filename: String,
    pub num_chunks: i64,
    pub indexed_at: String,
    pub source_path: Option<String>,
}

/// Indexed-document repository for database operations
pub struct DocumentRepository;

impl DocumentRepository {
    /// Record (or refresh) the metadata row for an ingested document.
    ///
    /// Re-ingestion is delete+insert at the index level, so the metadata row
    /// is simply replaced.
    pub async fn record(
        pool: &SqlitePool,
        filename: &str,
        num_chunks: i64,
        source_path: Option<&str>,
    ) -> DbResult<IndexedDocument> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO indexed_documents (filename, num_chunks, indexed_at, source_path)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(filename) DO UPDATE SET
                num_chunks = excluded.num_chunks,
                indexed_at = excluded.indexed_at,
                source_path = excluded.source_path",
        )
        .bind(filename)
        .bind(num_chunks)
        .bind(&now)
        .bind(source_path)
        .execute(pool)
        .await?;

        info!("Recorded indexed document: {} ({} chunks)", filename, num_chunks);

        let row = sqlx::query_as::<_, IndexedDocument>(
            "SELECT id, filename, num_chunks, indexed_at, source_path
             FROM indexed_documents WHERE filename = ?",
        )
        .bind(filename)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// List all indexed documents, newest first.
    pub async fn list(pool: &SqlitePool) -> DbResult<Vec<IndexedDocument>> {
        let rows = sqlx::query_as::<_, IndexedDocument>(
            "SELECT id, filename, num_chunks, indexed_at, source_path
             FROM indexed_documents
             ORDER BY indexed_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Delete the metadata row for a filename. Returns whether a row existed.
    pub async fn delete(pool: &SqlitePool, filename: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM indexed_documents WHERE filename = ?")
            .bind(filename)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_pool;

    #[tokio::test]
    async fn record_list_delete_roundtrip() {
        let db = create_test_pool().await.unwrap();

        let doc = DocumentRepository::record(db.pool(), "contract.txt", 12, Some("data/contract.txt"))
            .await
            .unwrap();
        assert_eq!(doc.filename, "contract.txt");
        assert_eq!(doc.num_chunks, 12);

        let listed = DocumentRepository::list(db.pool()).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(DocumentRepository::delete(db.pool(), "contract.txt").await.unwrap());
        assert!(!DocumentRepository::delete(db.pool(), "contract.txt").await.unwrap());
        assert!(DocumentRepository::list(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_refreshes_existing_row() {
        let db = create_test_pool().await.unwrap();

        DocumentRepository::record(db.pool(), "policy.pdf", 4, None)
            .await
            .unwrap();
        let refreshed = DocumentRepository::record(db.pool(), "policy.pdf", 9, None)
            .await
            .unwrap();

        assert_eq!(refreshed.num_chunks, 9);
        assert_eq!(DocumentRepository::list(db.pool()).await.unwrap().len(), 1);
    }
}
