//! Progression service.
//!
//! Wraps the engine and a store into the operations the transport layer
//! calls. Every read-compute-write for a user runs under that user's lock,
//! so two events for the same learner never interleave. Different learners
//! proceed in parallel.

use crate::engine::{OutcomeSummary, ProgressionEngine};
use crate::error::{StaarError, StaarResult};
use crate::event::ProgressEvent;
use crate::record::UserProgressionRecord;
use crate::storage::ProgressStore;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct ProgressionService<S: ProgressStore, R: Rng = StdRng> {
    store: S,
    engine: ProgressionEngine,
    rng: Mutex<R>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: ProgressStore> ProgressionService<S, StdRng> {
    /// Service with an entropy-seeded generator
    pub fn new(store: S, engine: ProgressionEngine) -> Self {
        Self::with_rng(store, engine, StdRng::from_entropy())
    }

    /// Service whose mystery boxes replay exactly for a given seed
    pub fn seeded(store: S, engine: ProgressionEngine, seed: u64) -> Self {
        Self::with_rng(store, engine, StdRng::seed_from_u64(seed))
    }
}

impl<S: ProgressStore, R: Rng> ProgressionService<S, R> {
    pub fn with_rng(store: S, engine: ProgressionEngine, rng: R) -> Self {
        Self {
            store,
            engine,
            rng: Mutex::new(rng),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn user_lock(&self, user_id: &str) -> StaarResult<Arc<Mutex<()>>> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|_| StaarError::LockPoisoned("user lock table"))?;
        Ok(locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Run `f` holding the user's lock. The table entry is dropped again
    /// once no other caller holds or waits on it, so the table only ever
    /// holds users with work in flight.
    fn with_user_lock<T>(
        &self,
        user_id: &str,
        f: impl FnOnce() -> StaarResult<T>,
    ) -> StaarResult<T> {
        let lock = self.user_lock(user_id)?;
        let result = {
            let _guard = lock
                .lock()
                .map_err(|_| StaarError::LockPoisoned("user lock"))?;
            f()
        };

        // Clones are only handed out under the table mutex, so a count of 2
        // (table + this caller) cannot grow while we hold it.
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|_| StaarError::LockPoisoned("user lock table"))?;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
        result
    }

    /// Users with a lock entry, i.e. an event in flight
    pub fn tracked_users(&self) -> usize {
        self.user_locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn load_or_new(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> StaarResult<(UserProgressionRecord, bool)> {
        match self.store.read(user_id)? {
            Some(record) => Ok((record, false)),
            None => {
                debug!("[STORE] creating record for {}", user_id);
                Ok((UserProgressionRecord::new(user_id, display_name, now), true))
            }
        }
    }

    /// Stored record, creating and persisting a default one on first access
    pub fn get_or_create(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> StaarResult<UserProgressionRecord> {
        self.with_user_lock(user_id, || {
            let (record, created) = self.load_or_new(user_id, display_name, now)?;
            if created {
                self.store.upsert(&record)?;
            }
            Ok(record)
        })
    }

    /// Apply one event for a user and persist the result
    pub fn apply_event(
        &self,
        user_id: &str,
        event: &ProgressEvent,
        now: DateTime<Utc>,
    ) -> StaarResult<(UserProgressionRecord, OutcomeSummary)> {
        let (record, outcome) = self.with_user_lock(user_id, || {
            let (mut record, _) = self.load_or_new(user_id, None, now)?;

            let outcome = {
                let mut rng = self
                    .rng
                    .lock()
                    .map_err(|_| StaarError::LockPoisoned("rng"))?;
                self.engine.apply_event(&mut record, event, now, &mut *rng)
            };

            self.store.upsert(&record)?;
            Ok((record, outcome))
        })?;

        if outcome.level_up || !outcome.new_badges.is_empty() {
            info!(
                "[EVENT] {} level={} badges+{} points={}",
                user_id,
                record.current_level,
                outcome.new_badges.len(),
                record.total_points
            );
        }
        Ok((record, outcome))
    }

    /// Highest-scoring learners, ties by user id
    pub fn top_n(&self, n: usize) -> StaarResult<Vec<UserProgressionRecord>> {
        self.store.top_by_points(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 16, 30, 0).unwrap()
    }

    fn service() -> ProgressionService<MemoryStore> {
        ProgressionService::seeded(MemoryStore::new(), ProgressionEngine::default(), 7)
    }

    #[test]
    fn test_get_or_create_persists_defaults() {
        let svc = service();
        let record = svc.get_or_create("kid", Some("Maya"), now()).unwrap();
        assert_eq!(record.display_name, "Maya");
        assert_eq!(svc.store().len(), 1);

        // Second access keeps the stored name
        let again = svc.get_or_create("kid", Some("Other"), now()).unwrap();
        assert_eq!(again.display_name, "Maya");
    }

    #[test]
    fn test_apply_event_creates_record() {
        let svc = service();
        let (record, outcome) = svc
            .apply_event("new-kid", &ProgressEvent::answer(true), now())
            .unwrap();
        assert_eq!(record.questions_answered, 1);
        assert_eq!(outcome.new_badges[0].id, "first_win");

        let stored = svc.store().read("new-kid").unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn test_lock_table_empties_after_events() {
        let svc = service();
        for i in 0..50 {
            let user = format!("user-{}", i);
            svc.apply_event(&user, &ProgressEvent::answer(true), now()).unwrap();
            svc.get_or_create(&user, None, now()).unwrap();
        }
        assert_eq!(svc.tracked_users(), 0);
        assert_eq!(svc.store().len(), 50);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        svc.apply_event("shared", &ProgressEvent::answer(true), now())
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(svc.tracked_users(), 0);
        let shared = svc.store().read("shared").unwrap().unwrap();
        assert_eq!(shared.questions_answered, 80);
    }

    #[test]
    fn test_top_n() {
        let svc = service();
        svc.apply_event("a", &ProgressEvent::answer(true).with_points(5), now()).unwrap();
        svc.apply_event("b", &ProgressEvent::answer(true).with_points(50), now()).unwrap();
        svc.apply_event("c", &ProgressEvent::answer(false), now()).unwrap();

        let top = svc.top_n(2).unwrap();
        let ids: Vec<&str> = top.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
