//! In-memory progress store.
//!
//! Used by tests and `--memory` runs. Nothing survives the process.

use super::{leaderboard_order, ProgressStore};
use crate::error::{StaarError, StaarResult};
use crate::record::UserProgressionRecord;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, UserProgressionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressStore for MemoryStore {
    fn read(&self, user_id: &str) -> StaarResult<Option<UserProgressionRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StaarError::LockPoisoned("memory store"))?;
        Ok(records.get(user_id).cloned())
    }

    fn upsert(&self, record: &UserProgressionRecord) -> StaarResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StaarError::LockPoisoned("memory store"))?;
        records.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn top_by_points(&self, limit: usize) -> StaarResult<Vec<UserProgressionRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StaarError::LockPoisoned("memory store"))?;
        let mut all: Vec<UserProgressionRecord> = records.values().cloned().collect();
        all.sort_by(leaderboard_order);
        all.truncate(limit);
        Ok(all)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
