//! Conversational memory consulted by the planner and fed by the responder.
//! Memory is best-effort: callers log failures and keep going.

pub mod idempotency;
pub mod repository;
pub mod retrieval;

pub use idempotency::compute_memory_key;
pub use repository::{PersistOutcome, SqliteMemoryStore};
pub use retrieval::{lexical_score, query_terms, rank_memories, StoredMemory};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create memory database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("memory unavailable: {0}")]
    Unavailable(String),
}

pub trait MemoryStore: Send + Sync {
    /// Up to `k` stored entries most relevant to `query`, best first.
    fn recall(&self, query: &str, k: usize) -> Result<Vec<String>, MemoryError>;
    fn remember(&self, text: &str) -> Result<(), MemoryError>;
}

/// Used when memory is disabled in settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMemoryStore;

impl MemoryStore for NullMemoryStore {
    fn recall(&self, _query: &str, _k: usize) -> Result<Vec<String>, MemoryError> {
        Ok(Vec::new())
    }

    fn remember(&self, _text: &str) -> Result<(), MemoryError> {
        Ok(())
    }
}
