//! docket-db: Relational storage for the intake assistant.
//!
//! This crate provides database operations for:
//! - Case records (creation, caller lookup, follow-up note appends)
//! - Indexed-document metadata bookkeeping
//!
//! The actual document vectors live in the docket-knowledge chunk store;
//! only their metadata is tracked here.

pub mod cases;
pub mod db;
pub mod documents;
pub mod error;

// Re-export commonly used types
pub use cases::{CaseIntake, CaseRecord, CaseRepository, FollowUpNote, NewCase};
pub use db::DbPool;
pub use documents::{DocumentRepository, IndexedDocument};
pub use error::{DbError, DbResult};

// Re-export test helpers when running tests or when test-helpers feature is enabled
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
