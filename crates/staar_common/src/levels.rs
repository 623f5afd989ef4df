//! Level titles, level progress and reward milestones.
//!
//! ## Level curve
//!
//! Linear: level L is reached at `(L - 1) * points_per_level` total points.
//! With the default 300 points per level:
//! - Level 1: 0 points
//! - Level 2: 300 points
//! - Level 5: 1,200 points
//!
//! ## Titles
//!
//! Title bands mirror the level picker in the quiz: Beginner, Explorer,
//! Champion, Star Player, then Legend for everything above.

use crate::record::UserProgressionRecord;
use serde::{Deserialize, Serialize};

/// Title bands mapping level ranges to titles
pub const TITLE_BANDS: &[(u32, u32, &str)] = &[
    (1, 1, "Beginner"),
    (2, 2, "Explorer"),
    (3, 3, "Champion"),
    (4, 4, "Star Player"),
    (5, u32::MAX, "Legend"),
];

/// Title for a level
pub fn level_title(level: u32) -> &'static str {
    for &(min, max, title) in TITLE_BANDS {
        if level >= min && level <= max {
            return title;
        }
    }
    "Beginner"
}

/// Where a learner stands inside the current level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub title: String,
    /// Points earned since the current level started
    pub points_into_level: u64,
    /// Points still needed for the next level
    pub points_to_next: u64,
    /// 0-100
    pub percent: u8,
}

impl LevelProgress {
    pub fn for_record(record: &UserProgressionRecord, points_per_level: u64) -> Self {
        let level = record.current_level.max(1);
        let floor = (level as u64 - 1).saturating_mul(points_per_level);
        let next = (level as u64).saturating_mul(points_per_level);
        let points_into_level = record.total_points.saturating_sub(floor);
        let points_to_next = next.saturating_sub(record.total_points);

        let percent = if points_per_level == 0 {
            100
        } else {
            ((points_into_level as u128 * 100) / points_per_level as u128).min(100) as u8
        };

        Self {
            level,
            title: level_title(level).to_string(),
            points_into_level,
            points_to_next,
            percent,
        }
    }
}

/// A real-world reward a parent attaches to a points total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardMilestone {
    pub points: u64,
    pub reward: String,
    #[serde(default)]
    pub icon: String,
}

impl RewardMilestone {
    fn new(points: u64, reward: &str, icon: &str) -> Self {
        Self {
            points,
            reward: reward.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Milestones shipped by default; parents override them in config
pub fn default_rewards() -> Vec<RewardMilestone> {
    vec![
        RewardMilestone::new(100, "15 min extra screen time", "📱"),
        RewardMilestone::new(250, "Special dessert", "🍰"),
        RewardMilestone::new(500, "Movie night pick", "🎬"),
        RewardMilestone::new(750, "Small toy or book", "🎁"),
        RewardMilestone::new(1000, "Fun outing", "🎉"),
        RewardMilestone::new(1500, "Big reward!", "🏆"),
    ]
}

/// The next milestone above a total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextReward {
    pub milestone: RewardMilestone,
    pub points_to_go: u64,
}

/// First milestone strictly above `total_points`, None once all are passed
pub fn next_reward(total_points: u64, milestones: &[RewardMilestone]) -> Option<NextReward> {
    milestones
        .iter()
        .filter(|m| m.points > total_points)
        .min_by_key(|m| m.points)
        .map(|m| NextReward {
            milestone: m.clone(),
            points_to_go: m.points - total_points,
        })
}

/// Milestones already reached, lowest first
pub fn reached_rewards(total_points: u64, milestones: &[RewardMilestone]) -> Vec<RewardMilestone> {
    let mut reached: Vec<_> = milestones
        .iter()
        .filter(|m| m.points <= total_points)
        .cloned()
        .collect();
    reached.sort_by_key(|m| m.points);
    reached
}
