//! Mystery boxes drawn on game completion.
//!
//! A box appears with `trigger_chance`. Its content is picked in two steps:
//! every catalog entry rolls its own rarity, then one survivor is chosen
//! uniformly. If nothing survives, a uniform pick among the non-badge
//! entries is used instead.
//!
//! All randomness comes from the caller's `Rng`, so a seeded generator
//! reproduces the exact same draws.

use crate::record::{Badge, UserProgressionRecord};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a box gives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoxReward {
    Points { amount: u64 },
    Badge { name: String, description: String, icon: String },
    Message { text: String },
}

impl BoxReward {
    pub fn is_badge(&self) -> bool {
        matches!(self, BoxReward::Badge { .. })
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
    pub reward: BoxReward,
    /// Chance this entry survives the rarity roll; config default when unset
    #[serde(default)]
    pub rarity: Option<f64>,
}

impl BoxEntry {
    fn new(id: &str, label: &str, icon: &str, reward: BoxReward, rarity: Option<f64>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            reward,
            rarity,
        }
    }
}

pub fn default_entries() -> Vec<BoxEntry> {
    vec![
        BoxEntry::new("small_points", "Bonus Points", "🪙", BoxReward::Points { amount: 25 }, None),
        BoxEntry::new("medium_points", "Point Pouch", "💰", BoxReward::Points { amount: 50 }, None),
        BoxEntry::new(
            "large_points",
            "Treasure Chest",
            "💎",
            BoxReward::Points { amount: 150 },
            Some(0.10),
        ),
        BoxEntry::new(
            "lucky_badge",
            "Lucky Badge",
            "🍀",
            BoxReward::Badge {
                name: "Lucky Box".to_string(),
                description: "Found a badge inside a mystery box".to_string(),
                icon: "🍀".to_string(),
            },
            Some(0.25),
        ),
        BoxEntry::new(
            "cheer_keep_going",
            "Cheer",
            "🎈",
            BoxReward::Message { text: "Keep going, you're doing great!".to_string() },
            None,
        ),
        BoxEntry::new(
            "cheer_brain_power",
            "Cheer",
            "🧠",
            BoxReward::Message { text: "Brain power activated!".to_string() },
            None,
        ),
    ]
}

/// Mystery box settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysteryBoxConfig {
    /// Chance a finished game yields a box
    #[serde(default = "default_trigger_chance")]
    pub trigger_chance: f64,
    /// Rarity applied to entries that do not set one
    #[serde(default = "default_rarity")]
    pub default_rarity: f64,
    #[serde(default = "default_entries")]
    pub entries: Vec<BoxEntry>,
}

fn default_trigger_chance() -> f64 {
    0.70
}

fn default_rarity() -> f64 {
    1.0
}

impl Default for MysteryBoxConfig {
    fn default() -> Self {
        Self {
            trigger_chance: default_trigger_chance(),
            default_rarity: default_rarity(),
            entries: default_entries(),
        }
    }
}

/// A drawn box as shown to the learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysteryBox {
    pub entry_id: String,
    pub label: String,
    pub icon: String,
    pub reward: BoxReward,
    pub points_awarded: u64,
    pub badge: Option<Badge>,
    pub message: Option<String>,
}

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.gen_bool(chance.clamp(0.0, 1.0))
}

/// Pick one entry: rarity filter, uniform among survivors, non-badge fallback
pub fn select_entry<'a, R: Rng + ?Sized>(
    entries: &'a [BoxEntry],
    default_rarity: f64,
    rng: &mut R,
) -> Option<&'a BoxEntry> {
    let survivors: Vec<&BoxEntry> = entries
        .iter()
        .filter(|e| roll(&mut *rng, e.rarity.unwrap_or(default_rarity)))
        .collect();

    if survivors.is_empty() {
        let fallback: Vec<&BoxEntry> = entries.iter().filter(|e| !e.reward.is_badge()).collect();
        return fallback.choose(rng).copied();
    }

    survivors.choose(rng).copied()
}

/// Maybe draw a box for a finished game and apply its effect to the record
pub fn draw<R: Rng + ?Sized>(
    record: &mut UserProgressionRecord,
    config: &MysteryBoxConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<MysteryBox> {
    if !roll(rng, config.trigger_chance) {
        debug!("[BOX] no box this game");
        return None;
    }

    let entry = select_entry(&config.entries, config.default_rarity, rng)?;
    record.mystery_boxes_opened += 1;

    let mut drawn = MysteryBox {
        entry_id: entry.id.clone(),
        label: entry.label.clone(),
        icon: entry.icon.clone(),
        reward: entry.reward.clone(),
        points_awarded: 0,
        badge: None,
        message: None,
    };

    match &entry.reward {
        BoxReward::Points { amount } => {
            record.total_points = record.total_points.saturating_add(*amount);
            drawn.points_awarded = *amount;
        }
        BoxReward::Badge { name, description, icon } => {
            let badge = Badge {
                id: format!("mystery_{}", record.mystery_boxes_opened),
                name: name.clone(),
                description: description.clone(),
                icon: icon.clone(),
                earned_at: now,
            };
            if record.award(badge.clone()) {
                drawn.badge = Some(badge);
            }
        }
        BoxReward::Message { text } => {
            drawn.message = Some(text.clone());
        }
    }

    info!(
        "[BOX] {} opened box #{}: {}",
        record.user_id, record.mystery_boxes_opened, entry.id
    );
    Some(drawn)
}
