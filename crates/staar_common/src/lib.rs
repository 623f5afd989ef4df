//! Progression engine for the STAAR quiz.
//!
//! Turns per-answer and per-game events into points, levels, streaks,
//! combos, badges, daily challenge progress and mystery boxes, and persists
//! the resulting per-user record through a pluggable store.

pub mod badges;
pub mod challenges;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod levels;
pub mod mystery_box;
pub mod record;
pub mod scoring;
pub mod service;
pub mod storage;
pub mod streak;

pub use config::StaarConfig;
pub use engine::{OutcomeSummary, ProgressionEngine};
pub use error::{StaarError, StaarResult};
pub use event::ProgressEvent;
pub use record::{Badge, UserProgressionRecord};
pub use service::ProgressionService;
pub use storage::{open_store, MemoryStore, ProgressStore, SqliteStore};
