//! SQLite progress store.
//!
//! Schema:
//! - progress: one row per user; the full record as JSON plus the columns
//!   the leaderboard sorts on
//!
//! Records are serialized with serde_json, so older rows missing newer
//! fields still load through the record's serde defaults.

use super::ProgressStore;
use crate::error::{StaarError, StaarResult};
use crate::record::UserProgressionRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS progress (
        user_id       TEXT PRIMARY KEY,
        display_name  TEXT NOT NULL,
        total_points  INTEGER NOT NULL,
        current_level INTEGER NOT NULL,
        record_json   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_progress_points
        ON progress (total_points DESC, user_id ASC);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file, creating parent directories
    pub fn open(path: &Path) -> StaarResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!("[STORE] opened sqlite store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> StaarResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StaarResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StaarResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StaarError::LockPoisoned("sqlite connection"))
    }

    /// Number of stored records
    pub fn count(&self) -> StaarResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM progress", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl ProgressStore for SqliteStore {
    fn read(&self, user_id: &str) -> StaarResult<Option<UserProgressionRecord>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM progress WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, record: &UserProgressionRecord) -> StaarResult<()> {
        let json = serde_json::to_string(record)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO progress (user_id, display_name, total_points, current_level, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                total_points = excluded.total_points,
                current_level = excluded.current_level,
                record_json = excluded.record_json",
            params![
                record.user_id,
                record.display_name,
                to_sql_int(record.total_points),
                record.current_level as i64,
                json
            ],
        )?;
        Ok(())
    }

    fn top_by_points(&self, limit: usize) -> StaarResult<Vec<UserProgressionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT record_json FROM progress
             ORDER BY total_points DESC, user_id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![to_sql_int(limit as u64)], |row| {
            row.get::<_, String>(0)
        })?;

        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn rec(id: &str, points: u64) -> UserProgressionRecord {
        let mut r = UserProgressionRecord::new(id, None, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
        r.total_points = points;
        r
    }

    #[test]
    fn test_read_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.read("ghost").unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&rec("kid", 10)).unwrap();
        let mut updated = rec("kid", 90);
        updated.display_name = "Maya".to_string();
        store.upsert(&updated).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let loaded = store.read("kid").unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn test_top_by_points_with_ties() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (id, points) in [("zed", 30), ("amy", 30), ("bob", 80), ("cat", 1)] {
            store.upsert(&rec(id, points)).unwrap();
        }
        let top = store.top_by_points(3).unwrap();
        let ids: Vec<&str> = top.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "amy", "zed"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert(&rec("kid", 77)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.read("kid").unwrap().unwrap().total_points, 77);
    }
}
