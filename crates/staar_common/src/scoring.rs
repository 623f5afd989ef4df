//! Points, combos and level checks for a single answer.
//!
//! ## Combo multiplier
//!
//! Step function of the current combo length, highest matching tier wins:
//! - combo >= 5: x3.0
//! - combo >= 3: x2.0
//! - combo >= 2: x1.5
//! - otherwise: x1.0
//!
//! Combo bonus is `floor(base * (multiplier - 1))`.
//!
//! ## Levels
//!
//! Level L is left once total points reach `L * points_per_level`.

use crate::config::EngineConfig;
use crate::record::UserProgressionRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One step of the combo multiplier table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub min_combo: u32,
    pub multiplier: f64,
}

pub fn default_combo_tiers() -> Vec<ComboTier> {
    vec![
        ComboTier { min_combo: 5, multiplier: 3.0 },
        ComboTier { min_combo: 3, multiplier: 2.0 },
        ComboTier { min_combo: 2, multiplier: 1.5 },
    ]
}

/// Multiplier for a combo length; tiers may be in any order
pub fn combo_multiplier(combo: u32, tiers: &[ComboTier]) -> f64 {
    tiers
        .iter()
        .filter(|t| combo >= t.min_combo)
        .max_by_key(|t| t.min_combo)
        .map(|t| t.multiplier)
        .unwrap_or(1.0)
}

/// Extra points on top of the base for a multiplier
pub fn combo_bonus(base_points: u64, multiplier: f64) -> u64 {
    if multiplier <= 1.0 {
        return 0;
    }
    (base_points as f64 * (multiplier - 1.0)).floor() as u64
}

/// How many levels one event may grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelUpPolicy {
    /// At most one level per event
    Single,
    /// As many levels as the points cover
    Cascade,
}

impl Default for LevelUpPolicy {
    fn default() -> Self {
        Self::Single
    }
}

impl LevelUpPolicy {
    /// Level budget for one event, None means unlimited
    pub fn budget(&self) -> Option<u32> {
        match self {
            LevelUpPolicy::Single => Some(1),
            LevelUpPolicy::Cascade => None,
        }
    }
}

/// Raise the level while points allow, spending at most `budget` levels.
/// Returns the number of levels gained.
pub fn check_level_up(
    record: &mut UserProgressionRecord,
    points_per_level: u64,
    budget: Option<u32>,
) -> u32 {
    let mut gained = 0u32;
    while budget.map_or(true, |b| gained < b)
        && record.current_level < u32::MAX
        && record.total_points >= (record.current_level as u64).saturating_mul(points_per_level)
    {
        record.current_level += 1;
        gained += 1;
    }
    gained
}

/// What scoring did for one answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub points_earned: u64,
    pub combo: u32,
    pub multiplier: f64,
    pub combo_bonus: u64,
    pub levels_gained: u32,
}

/// Apply one answer to the record's counters, combo, points and level
pub fn score_answer(
    record: &mut UserProgressionRecord,
    correct: bool,
    base_points: u64,
    streak_bonus: u64,
    config: &EngineConfig,
) -> ScoreOutcome {
    record.questions_answered += 1;

    if !correct {
        if record.current_combo > 0 {
            debug!("[SCORE] combo of {} broken", record.current_combo);
        }
        record.current_combo = 0;
        return ScoreOutcome {
            points_earned: 0,
            combo: 0,
            multiplier: 1.0,
            combo_bonus: 0,
            levels_gained: 0,
        };
    }

    record.correct_answers += 1;
    record.current_combo += 1;
    record.max_combo = record.max_combo.max(record.current_combo);

    let multiplier = combo_multiplier(record.current_combo, &config.combo_tiers);
    let bonus = combo_bonus(base_points, multiplier);
    let points_earned = base_points.saturating_add(bonus).saturating_add(streak_bonus);
    record.total_points = record.total_points.saturating_add(points_earned);

    debug!(
        "[SCORE] +{} (base {}, combo {} x{} = +{}, streak +{})",
        points_earned, base_points, record.current_combo, multiplier, bonus, streak_bonus
    );

    let levels_gained = check_level_up(
        record,
        config.points_per_level,
        config.level_up_policy.budget(),
    );

    ScoreOutcome {
        points_earned,
        combo: record.current_combo,
        multiplier,
        combo_bonus: bonus,
        levels_gained,
    }
}
