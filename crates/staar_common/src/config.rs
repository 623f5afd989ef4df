//! STAAR Configuration System
//!
//! Tunables for scoring, challenges, mystery boxes, reward milestones and
//! storage. Every section is optional in the file; missing values fall back
//! to the defaults the quiz ships with.
//!
//! Config file: ~/.config/staar/config.toml or /etc/staar/config.toml

use crate::challenges::{default_templates, ChallengeTemplate};
use crate::error::{StaarError, StaarResult};
use crate::levels::{default_rewards, RewardMilestone};
use crate::mystery_box::MysteryBoxConfig;
use crate::record::DEFAULT_SUBJECTS;
use crate::scoring::{default_combo_tiers, ComboTier, LevelUpPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Scoring and badge tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Level L is left at L * points_per_level total points
    pub points_per_level: u64,
    /// Points for an answer that does not carry its own
    pub default_base_points: u64,
    /// Streak bonus = streak length * this, on consecutive days
    pub streak_bonus_per_day: u64,
    pub level_up_policy: LevelUpPolicy,
    pub combo_tiers: Vec<ComboTier>,
    /// Percent accuracy needed for the sharpshooter badge
    pub accuracy_badge_threshold: f64,
    pub accuracy_badge_min_questions: u64,
    /// Subjects the question bank serves; others are accepted but logged
    pub known_subjects: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            points_per_level: 300,
            default_base_points: 10,
            streak_bonus_per_day: 10,
            level_up_policy: LevelUpPolicy::Single,
            combo_tiers: default_combo_tiers(),
            accuracy_badge_threshold: 90.0,
            accuracy_badge_min_questions: 10,
            known_subjects: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    pub fn is_known_subject(&self, subject: &str) -> bool {
        self.known_subjects.iter().any(|s| s == subject)
    }
}

/// Daily challenge catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_templates")]
    pub templates: Vec<ChallengeTemplate>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            templates: default_templates(),
        }
    }
}

/// Where progress records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process map, lost on exit
    Memory,
    /// SQLite file at `db_path`
    Sqlite,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Sqlite
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("/var/lib"));
        Self {
            backend: StorageBackend::Sqlite,
            db_path: base.join("staar").join("progress.db"),
        }
    }
}

/// Main STAAR configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaarConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub challenges: ChallengeConfig,

    #[serde(default)]
    pub mystery_box: MysteryBoxConfig,

    /// Parent-configured real-world rewards
    #[serde(default = "default_rewards")]
    pub rewards: Vec<RewardMilestone>,

    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for StaarConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            engine: EngineConfig::default(),
            challenges: ChallengeConfig::default(),
            mystery_box: MysteryBoxConfig::default(),
            rewards: default_rewards(),
            storage: StorageConfig::default(),
        }
    }
}

impl StaarConfig {
    /// User config path: ~/.config/staar/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("staar").join("config.toml"))
    }

    /// System config path: /etc/staar/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/staar/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/staar/config.toml)
    /// 3. System config (/etc/staar/config.toml)
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Load and validate one file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: StaarConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string = self.to_toml()?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> StaarResult<()> {
        let engine = &self.engine;
        if engine.points_per_level == 0 {
            return Err(StaarError::Config("engine.points_per_level must be positive".into()));
        }
        if let Some(tier) = engine.combo_tiers.iter().find(|t| t.multiplier < 1.0) {
            return Err(StaarError::Config(format!(
                "combo tier at {} has multiplier {} below 1.0",
                tier.min_combo, tier.multiplier
            )));
        }
        if !(0.0..=100.0).contains(&engine.accuracy_badge_threshold) {
            return Err(StaarError::Config(
                "engine.accuracy_badge_threshold must be within 0..=100".into(),
            ));
        }

        let boxes = &self.mystery_box;
        if !(0.0..=1.0).contains(&boxes.trigger_chance) {
            return Err(StaarError::Config(
                "mystery_box.trigger_chance must be within 0..=1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&boxes.default_rarity) {
            return Err(StaarError::Config(
                "mystery_box.default_rarity must be within 0..=1".into(),
            ));
        }
        for entry in &boxes.entries {
            if let Some(rarity) = entry.rarity {
                if !(0.0..=1.0).contains(&rarity) {
                    return Err(StaarError::Config(format!(
                        "mystery box entry '{}' has rarity {} outside 0..=1",
                        entry.id, rarity
                    )));
                }
            }
        }

        let mut ids: Vec<&str> = self.challenges.templates.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(StaarError::Config("duplicate daily challenge id".into()));
        }
        if let Some(t) = self.challenges.templates.iter().find(|t| t.goal == 0) {
            return Err(StaarError::Config(format!("challenge '{}' has a zero goal", t.id)));
        }

        Ok(())
    }
}
