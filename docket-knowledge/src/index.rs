//! The document index engine: ingest, remove-by-filename, similarity search.

use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::IndexSettings;
use crate::chunker::{Chunk, chunk_text};
use crate::embeddings::Embedder;
use crate::errors::{IndexError, IndexResult};
use crate::loader;
use crate::storage::{self, ChunkStore};

/// Bookkeeping result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub filename: String,
    pub chunk_count: usize,
}

/// One search result chunk.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub filename: String,
    pub chunk_index: i64,
    pub content: String,
    pub distance: f32,
}

/// Durable, queryable text index over the document corpus.
///
/// Writes (`ingest`/`remove`) are serialized behind a single lock so no
/// reader ever observes a half-ingested or half-deleted document.
pub struct DocumentIndex {
    settings: IndexSettings,
    embedder: Arc<dyn Embedder>,
    store: ChunkStore,
    write_lock: Mutex<()>,
}

impl DocumentIndex {
    /// Open the index at the configured chunk-store path.
    pub async fn open(settings: IndexSettings, embedder: Arc<dyn Embedder>) -> IndexResult<Self> {
        let db_path = settings.resolved_db_path()?;
        Self::open_at(settings, &db_path, embedder).await
    }

    /// Open the index at an explicit path (tests point this at a temp dir).
    pub async fn open_at(
        settings: IndexSettings,
        db_path: &Path,
        embedder: Arc<dyn Embedder>,
    ) -> IndexResult<Self> {
        let store = ChunkStore::open(db_path, settings.embedding_dim).await?;
        Ok(Self {
            settings,
            embedder,
            store,
            write_lock: Mutex::new(()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Load the persisted index, or build it from the source directory.
    ///
    /// When chunks already exist this only probes the embedding backend; a
    /// fresh store is populated by scanning `source_dir`. Either way an
    /// unreachable embedding backend here is fatal: it is a startup
    /// dependency, not a per-request one.
    pub async fn initialize(&self) -> IndexResult<Vec<IngestReport>> {
        let existing = storage::count_chunks(self.pool()).await?;
        if existing > 0 {
            self.embedder
                .embed_batch(&["startup probe".to_string()])
                .await?;
            info!("Document index loaded ({existing} chunks)");
            return Ok(Vec::new());
        }

        let source_dir = self.settings.source_dir.clone();
        if !source_dir.is_dir() {
            warn!(
                "Document source directory {} does not exist; starting with an empty index",
                source_dir.display()
            );
            self.embedder
                .embed_batch(&["startup probe".to_string()])
                .await?;
            return Ok(Vec::new());
        }

        let mut reports = Vec::new();
        let mut entries = tokio::fs::read_dir(&source_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            match self.ingest(&path).await {
                Ok(report) => {
                    info!(
                        "Indexed {} ({} chunks)",
                        report.filename, report.chunk_count
                    );
                    reports.push(report);
                }
                Err(IndexError::UnsupportedFile(path)) => {
                    warn!("Skipping unsupported file: {}", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        info!("Document index built from {} documents", reports.len());
        Ok(reports)
    }

    /// Ingest one document: load, chunk, embed, store.
    ///
    /// Re-ingesting a filename replaces its previous chunks. Embedding runs
    /// before any write so a backend failure leaves the store untouched.
    pub async fn ingest(&self, path: &Path) -> IndexResult<IngestReport> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| IndexError::UnsupportedFile(path.to_path_buf()))?;

        let text = loader::load_document(path).await?;
        let chunks = chunk_text(
            &text,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        let embeddings = self.embed_chunks(&chunks).await?;

        let _guard = self.write_lock.lock().await;
        storage::delete_chunks(self.pool(), &filename).await?;

        if let Some(first) = embeddings.first() {
            storage::ensure_vec_table_dim(self.pool(), first.len()).await?;
        }
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            let chunk_id = storage::insert_chunk(
                self.pool(),
                &filename,
                chunk.index as i64,
                &chunk.content,
            )
            .await?;
            storage::upsert_vec(self.pool(), chunk_id, embedding).await?;
        }

        Ok(IngestReport {
            filename,
            chunk_count: chunks.len(),
        })
    }

    /// Delete every chunk tagged with the filename. A filename with no
    /// chunks is a no-op, not an error.
    pub async fn remove(&self, filename: &str) -> IndexResult<u64> {
        let _guard = self.write_lock.lock().await;
        let removed = storage::delete_chunks(self.pool(), filename).await?;
        if removed > 0 {
            info!("Removed {removed} chunks for {filename}");
        }
        Ok(removed)
    }

    /// The k chunks most similar to the query. Pure read.
    pub async fn search(&self, query: &str, k: usize) -> IndexResult<Vec<ChunkHit>> {
        if storage::count_chunks(self.pool()).await? == 0 {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(&[query.to_string()]).await?;
        let Some(embedding) = embeddings.first() else {
            return Err(IndexError::Embedding(
                "embedding backend returned no vector for query".to_string(),
            ));
        };

        let rows = storage::search_vec(self.pool(), embedding, k).await?;
        Ok(rows
            .into_iter()
            .map(|(filename, chunk_index, content, distance)| ChunkHit {
                filename,
                chunk_index,
                content,
                distance,
            })
            .collect())
    }

    /// Whether the index currently holds any chunks.
    pub async fn is_empty(&self) -> IndexResult<bool> {
        Ok(storage::count_chunks(self.pool()).await? == 0)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> IndexResult<Vec<Vec<f32>>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = self.settings.embedding_batch.max(1);
        let mut embeddings = Vec::with_capacity(chunks.len());
        let mut offset = 0;
        while offset < chunks.len() {
            let end = (offset + batch_size).min(chunks.len());
            let inputs = chunks[offset..end]
                .iter()
                .map(|chunk| chunk.content.clone())
                .collect::<Vec<_>>();

            let batch = self.embedder.embed_batch(&inputs).await?;
            if batch.len() != inputs.len() {
                return Err(IndexError::Embedding(format!(
                    "embedding backend returned {} vectors for {} inputs",
                    batch.len(),
                    inputs.len()
                )));
            }

            for embedding in &batch {
                if let Some(expected) = self.settings.embedding_dim
                    && expected != embedding.len()
                {
                    return Err(IndexError::EmbeddingDimMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
            }

            embeddings.extend(batch);
            offset = end;
        }

        Ok(embeddings)
    }
}
