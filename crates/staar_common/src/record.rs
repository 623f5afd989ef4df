//! Per-user progression record.
//!
//! One record per learner, keyed by a stable user id. Created with zeroed
//! counters on first sight and mutated in place by every event.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Subjects the quiz ships with. Other subjects are tolerated.
pub const DEFAULT_SUBJECTS: &[&str] = &["math", "reading"];

/// A permanent achievement marker attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Unique per user; repeatable badges carry a numeric suffix
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon glyph shown by the frontend
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

/// How a daily challenge measures progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// +1 per finished game with at least one correct answer
    Counter,
    /// Number of distinct subjects played today
    DistinctSubjects,
    /// Accuracy percent reached in a single game
    Accuracy,
}

/// One challenge for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeInstance {
    pub id: String,
    pub kind: ChallengeKind,
    pub description: String,
    pub goal: u32,
    pub progress: u32,
    pub reward: u64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Challenge set generated for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallengeSnapshot {
    pub date: NaiveDate,
    pub challenges: Vec<ChallengeInstance>,
    #[serde(default)]
    pub subjects_today: BTreeSet<String>,
}

/// Everything the engine knows about one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgressionRecord {
    pub user_id: String,
    pub display_name: String,

    pub total_points: u64,
    /// Starts at 1, never decreases
    pub current_level: u32,
    pub questions_answered: u64,
    /// Always <= questions_answered
    pub correct_answers: u64,
    #[serde(default)]
    pub perfect_games: u64,
    #[serde(default)]
    pub mystery_boxes_opened: u64,

    pub streak_days: u32,
    pub longest_streak: u32,
    pub last_played: Option<DateTime<Utc>>,
    pub last_played_date: Option<NaiveDate>,

    /// Consecutive correct answers, reset by any miss
    #[serde(default)]
    pub current_combo: u32,
    /// High-water mark of current_combo
    #[serde(default)]
    pub max_combo: u32,

    #[serde(default)]
    pub subjects_completed: BTreeMap<String, u64>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub daily_challenges: Option<DailyChallengeSnapshot>,

    pub created_at: DateTime<Utc>,
}

impl UserProgressionRecord {
    /// Fresh record with zeroed counters and the default subjects seeded
    pub fn new(user_id: &str, display_name: Option<&str>, now: DateTime<Utc>) -> Self {
        let subjects_completed = DEFAULT_SUBJECTS
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();

        Self {
            user_id: user_id.to_string(),
            display_name: display_name.unwrap_or(user_id).to_string(),
            total_points: 0,
            current_level: 1,
            questions_answered: 0,
            correct_answers: 0,
            perfect_games: 0,
            mystery_boxes_opened: 0,
            streak_days: 0,
            longest_streak: 0,
            last_played: None,
            last_played_date: None,
            current_combo: 0,
            max_combo: 0,
            subjects_completed,
            badges: Vec::new(),
            daily_challenges: None,
            created_at: now,
        }
    }

    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b.id == id)
    }

    /// Append a badge unless one with the same id exists. Returns true if added.
    pub fn award(&mut self, badge: Badge) -> bool {
        if self.has_badge(&badge.id) {
            return false;
        }
        self.badges.push(badge);
        true
    }

    /// Completed games for a subject, 0 if never seen
    pub fn subject_count(&self, subject: &str) -> u64 {
        self.subjects_completed.get(subject).copied().unwrap_or(0)
    }

    /// Exact accuracy in percent (0.0 when nothing answered)
    pub fn accuracy(&self) -> f64 {
        if self.questions_answered == 0 {
            return 0.0;
        }
        (self.correct_answers as f64 / self.questions_answered as f64) * 100.0
    }

    /// True once accuracy is at or above `threshold` percent. Cross-multiplied
    /// so an exact hit like 57/100 against 57 is not lost to rounding.
    pub fn accuracy_at_least(&self, threshold: f64) -> bool {
        if self.questions_answered == 0 {
            return threshold <= 0.0;
        }
        self.correct_answers as f64 * 100.0 >= threshold * self.questions_answered as f64
    }

    /// Rounded accuracy percent for display
    pub fn accuracy_percent(&self) -> u8 {
        self.accuracy().round().clamp(0.0, 100.0) as u8
    }
}
