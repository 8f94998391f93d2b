//! Document index subsystem for docket.
//!
//! Owns the persistent vector store over the firm's document corpus:
//! chunking, embedding, ingestion, removal by filename, and similarity
//! search. Consumers treat it as a read path (search) plus an explicit
//! write path (ingest/remove) driven by document uploads.

pub mod chunker;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod loader;
pub mod storage;

pub use docket_core::config::IndexSettings;
pub use embeddings::{Embedder, EmbeddingClient};
pub use errors::{IndexError, IndexResult};
pub use index::{ChunkHit, DocumentIndex, IngestReport};
