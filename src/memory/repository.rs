use super::idempotency::compute_memory_key;
use super::retrieval::{rank_memories, StoredMemory};
use super::{MemoryError, MemoryStore};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    Duplicate,
}

/// SQLite-backed conversational memory. Each call opens its own connection
/// so the store can be shared across threads without a lock.
#[derive(Debug, Clone)]
pub struct SqliteMemoryStore {
    db_path: PathBuf,
}

impl SqliteMemoryStore {
    pub fn open(db_path: &Path) -> Result<Self, MemoryError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|source| MemoryError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, MemoryError> {
        Connection::open(&self.db_path).map_err(|source| MemoryError::Open {
            path: self.db_path.display().to_string(),
            source,
        })
    }

    pub fn ensure_schema(&self) -> Result<(), MemoryError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS memories (
                    memory_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    idempotency_key TEXT NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS memories_created_at
                    ON memories(created_at);
                ",
            )
            .map_err(|source| MemoryError::Sql { source })
    }

    pub fn persist(&self, text: &str) -> Result<PersistOutcome, MemoryError> {
        let connection = self.connect()?;
        let inserted = connection
            .execute(
                "INSERT INTO memories (idempotency_key, content, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(idempotency_key) DO NOTHING",
                params![
                    compute_memory_key(text),
                    text,
                    chrono::Utc::now().timestamp()
                ],
            )
            .map_err(|source| MemoryError::Sql { source })?;
        Ok(if inserted == 0 {
            PersistOutcome::Duplicate
        } else {
            PersistOutcome::Inserted
        })
    }

    pub fn count(&self) -> Result<usize, MemoryError> {
        let connection = self.connect()?;
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            .map_err(|source| MemoryError::Sql { source })?;
        Ok(count.max(0) as usize)
    }

    fn load_all(&self) -> Result<Vec<StoredMemory>, MemoryError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare("SELECT memory_id, content, created_at FROM memories")
            .map_err(|source| MemoryError::Sql { source })?;
        let rows = statement
            .query_map([], |row| {
                Ok(StoredMemory {
                    memory_id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|source| MemoryError::Sql { source })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| MemoryError::Sql { source })
    }
}

impl MemoryStore for SqliteMemoryStore {
    fn recall(&self, query: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        let ranked = rank_memories(query, self.load_all()?, k);
        Ok(ranked.into_iter().map(|memory| memory.content).collect())
    }

    fn remember(&self, text: &str) -> Result<(), MemoryError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.persist(text).map(|_| ())
    }
}
