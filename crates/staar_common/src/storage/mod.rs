//! Progress record storage.
//!
//! The engine never touches storage directly. The service reads a record,
//! runs the engine and upserts the result through a `ProgressStore`.
//!
//! Backends:
//! - `memory`: in-process map for tests and throwaway runs
//! - `sqlite`: durable single-file store

pub mod memory;
pub mod sqlite;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StaarResult;
use crate::record::UserProgressionRecord;
use std::cmp::Ordering;
use tracing::info;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key-value store of progress records by user id
pub trait ProgressStore: Send + Sync {
    /// Record for a user, None if never stored
    fn read(&self, user_id: &str) -> StaarResult<Option<UserProgressionRecord>>;

    /// Insert or replace the record under its user id
    fn upsert(&self, record: &UserProgressionRecord) -> StaarResult<()>;

    /// Up to `limit` records, highest total points first
    fn top_by_points(&self, limit: usize) -> StaarResult<Vec<UserProgressionRecord>>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn read(&self, user_id: &str) -> StaarResult<Option<UserProgressionRecord>> {
        (**self).read(user_id)
    }

    fn upsert(&self, record: &UserProgressionRecord) -> StaarResult<()> {
        (**self).upsert(record)
    }

    fn top_by_points(&self, limit: usize) -> StaarResult<Vec<UserProgressionRecord>> {
        (**self).top_by_points(limit)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Leaderboard order: points descending, then user id for stable ties
pub fn leaderboard_order(a: &UserProgressionRecord, b: &UserProgressionRecord) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Open the backend named in config
pub fn open_store(config: &StorageConfig) -> StaarResult<Box<dyn ProgressStore>> {
    let store: Box<dyn ProgressStore> = match config.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.db_path)?),
    };
    info!("[STORE] using {} backend", store.backend_name());
    Ok(store)
}
