//! Achievement badges.
//!
//! Evaluated last, against the record after every other stage of the event
//! has run. Every rule except the perfect-game one is one-shot: an id that is
//! already on the record is never minted again.

use crate::config::EngineConfig;
use crate::record::{Badge, UserProgressionRecord};
use chrono::{DateTime, Utc};
use tracing::info;

/// Static badge definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl BadgeDef {
    const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        icon: &'static str,
    ) -> Self {
        Self { id, name, description, icon }
    }

    fn mint(&self, now: DateTime<Utc>) -> Badge {
        Badge {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            earned_at: now,
        }
    }
}

pub const FIRST_WIN: BadgeDef =
    BadgeDef::new("first_win", "First Victory", "Answer your first question correctly!", "🎯");

pub const SHARPSHOOTER: BadgeDef = BadgeDef::new(
    "sharpshooter",
    "Sharp Shooter",
    "Maintain 90%+ accuracy over 10+ questions",
    "🎯",
);

/// Awarded when questions_answered hits the count exactly
pub const QUESTION_MILESTONES: &[(u64, BadgeDef)] = &[
    (10, BadgeDef::new("novice", "Novice Explorer", "Complete 10 questions", "📚")),
    (50, BadgeDef::new("apprentice", "Apprentice Scholar", "Complete 50 questions", "📖")),
    (100, BadgeDef::new("expert", "Expert Learner", "Complete 100 questions", "🎓")),
    (250, BadgeDef::new("master", "Master Student", "Complete 250 questions", "🏆")),
    (500, BadgeDef::new("legend", "Legendary Scholar", "Complete 500 questions", "👑")),
];

/// Awarded when streak_days hits the count exactly
pub const STREAK_MILESTONES: &[(u32, BadgeDef)] = &[
    (3, BadgeDef::new("streak_3", "3-Day Streak", "Play 3 days in a row", "🔥")),
    (7, BadgeDef::new("streak_7", "Week Warrior", "Play 7 days in a row", "⚡")),
    (14, BadgeDef::new("streak_14", "Two Week Champion", "Play 14 days in a row", "💪")),
    (30, BadgeDef::new("streak_30", "Month Master", "Play 30 days in a row", "🌟")),
];

/// Awarded when current_combo hits the count exactly
pub const COMBO_MILESTONES: &[(u32, BadgeDef)] = &[
    (5, BadgeDef::new("combo_5", "Hot Hand", "Answer 5 questions correctly in a row", "✋")),
    (10, BadgeDef::new("combo_10", "Unstoppable", "Answer 10 questions correctly in a row", "🚀")),
];

/// Per-subject completed-game milestones: (games, id suffix, title suffix)
pub const SUBJECT_MILESTONES: &[(u64, &str, &str)] = &[(10, "starter", "Starter"), (25, "master", "Master")];

fn subject_icon(subject: &str, suffix: &str) -> &'static str {
    match (subject, suffix) {
        ("math", "starter") => "🔢",
        ("math", _) => "🧮",
        ("reading", "starter") => "📖",
        ("reading", _) => "📚",
        (_, "starter") => "📘",
        _ => "🏅",
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Outcome flags of the current event that badges care about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeContext {
    pub perfect_game: bool,
}

/// Collects new badges while keeping ids unique against the record and
/// against badges minted earlier in the same pass
struct Minted<'a> {
    record: &'a UserProgressionRecord,
    badges: Vec<Badge>,
}

impl<'a> Minted<'a> {
    fn push(&mut self, badge: Badge) {
        if self.record.has_badge(&badge.id) || self.badges.iter().any(|b| b.id == badge.id) {
            return;
        }
        self.badges.push(badge);
    }
}

/// Scan the updated record and return the badges earned by this event.
///
/// Does not modify the record; the caller appends the result once.
pub fn evaluate_badges(
    record: &UserProgressionRecord,
    ctx: BadgeContext,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<Badge> {
    let mut minted = Minted { record, badges: Vec::new() };

    if record.questions_answered == 1 && record.correct_answers == 1 {
        minted.push(FIRST_WIN.mint(now));
    }

    for (count, def) in QUESTION_MILESTONES {
        if record.questions_answered == *count {
            minted.push(def.mint(now));
        }
    }

    if record.questions_answered >= config.accuracy_badge_min_questions
        && record.accuracy_at_least(config.accuracy_badge_threshold)
    {
        minted.push(SHARPSHOOTER.mint(now));
    }

    if ctx.perfect_game {
        minted.push(Badge {
            id: format!("perfect_{}", record.perfect_games),
            name: "Perfect Game!".to_string(),
            description: "100% accuracy in a game!".to_string(),
            icon: "💯".to_string(),
            earned_at: now,
        });
    }

    for (days, def) in STREAK_MILESTONES {
        if record.streak_days == *days {
            minted.push(def.mint(now));
        }
    }

    for (subject, games) in &record.subjects_completed {
        for (threshold, suffix, title) in SUBJECT_MILESTONES {
            if games == threshold {
                minted.push(Badge {
                    id: format!("{}_{}", subject, suffix),
                    name: format!("{} {}", title_case(subject), title),
                    description: format!("Complete {} {} games", threshold, subject),
                    icon: subject_icon(subject, suffix).to_string(),
                    earned_at: now,
                });
            }
        }
    }

    for (combo, def) in COMBO_MILESTONES {
        if record.current_combo == *combo {
            minted.push(def.mint(now));
        }
    }

    for badge in &minted.badges {
        info!("[BADGE] {} earned {}", record.user_id, badge.id);
    }
    minted.badges
}

/// Every one-shot badge with a fixed id, for listing what can be earned
pub fn fixed_catalog() -> Vec<BadgeDef> {
    let mut all = vec![FIRST_WIN, SHARPSHOOTER];
    all.extend(QUESTION_MILESTONES.iter().map(|(_, d)| *d));
    all.extend(STREAK_MILESTONES.iter().map(|(_, d)| *d));
    all.extend(COMBO_MILESTONES.iter().map(|(_, d)| *d));
    all
}

/// Format a badge for a notification line
pub fn format_badge_unlock(badge: &Badge) -> String {
    format!("{} Badge unlocked: {} - {}", badge.icon, badge.name, badge.description)
}

/// Compact icon strip of the most recent badges, newest first
pub fn format_badge_strip(badges: &[Badge], max_display: usize) -> String {
    if badges.is_empty() {
        return String::new();
    }
    let icons: Vec<&str> = badges.iter().rev().take(max_display).map(|b| b.icon.as_str()).collect();
    if badges.len() > max_display {
        format!("{} +{} more", icons.join(" "), badges.len() - max_display)
    } else {
        icons.join(" ")
    }
}
