//! Daily challenges.
//!
//! A snapshot of challenges is generated per calendar day from a template
//! catalog. Only finished games move challenge progress. A snapshot from
//! any other day is thrown away wholesale before progress is applied.

use crate::event::GameResult;
use crate::record::{ChallengeInstance, ChallengeKind, DailyChallengeSnapshot, UserProgressionRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Catalog entry a daily instance is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeTemplate {
    pub id: String,
    pub kind: ChallengeKind,
    pub description: String,
    /// Games, subjects or accuracy percent depending on kind
    pub goal: u32,
    pub reward: u64,
}

impl ChallengeTemplate {
    fn new(id: &str, kind: ChallengeKind, description: &str, goal: u32, reward: u64) -> Self {
        Self {
            id: id.to_string(),
            kind,
            description: description.to_string(),
            goal,
            reward,
        }
    }

    fn instantiate(&self) -> ChallengeInstance {
        ChallengeInstance {
            id: self.id.clone(),
            kind: self.kind,
            description: self.description.clone(),
            goal: self.goal,
            progress: 0,
            reward: self.reward,
            completed: false,
            completed_at: None,
        }
    }
}

pub fn default_templates() -> Vec<ChallengeTemplate> {
    vec![
        ChallengeTemplate::new(
            "daily_correct",
            ChallengeKind::Counter,
            "Finish 3 games with at least one correct answer",
            3,
            50,
        ),
        ChallengeTemplate::new(
            "daily_subjects",
            ChallengeKind::DistinctSubjects,
            "Play 2 different subjects today",
            2,
            75,
        ),
        ChallengeTemplate::new(
            "daily_accuracy",
            ChallengeKind::Accuracy,
            "Score 80% or better in one game",
            80,
            100,
        ),
    ]
}

/// Fresh snapshot for a day, one instance per template, zero progress
pub fn generate_snapshot(date: NaiveDate, templates: &[ChallengeTemplate]) -> DailyChallengeSnapshot {
    DailyChallengeSnapshot {
        date,
        challenges: templates.iter().map(ChallengeTemplate::instantiate).collect(),
        subjects_today: BTreeSet::new(),
    }
}

/// Challenges as they stand on `today`, without touching the record
pub fn challenges_for(
    record: &UserProgressionRecord,
    today: NaiveDate,
    templates: &[ChallengeTemplate],
) -> DailyChallengeSnapshot {
    match &record.daily_challenges {
        Some(snapshot) if snapshot.date == today => snapshot.clone(),
        _ => generate_snapshot(today, templates),
    }
}

/// Challenge rewards earned by one event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub reward_total: u64,
    pub completed: Vec<ChallengeInstance>,
}

/// Apply a finished game to today's challenges.
///
/// Rewards are returned, not credited; the caller adds them to the points.
pub fn update_daily_challenges(
    record: &mut UserProgressionRecord,
    game: &GameResult,
    now: DateTime<Utc>,
    templates: &[ChallengeTemplate],
) -> ChallengeProgress {
    let today = now.date_naive();
    let stale = record
        .daily_challenges
        .as_ref()
        .map_or(true, |s| s.date != today);
    if stale {
        debug!("[CHALLENGE] generating challenges for {}", today);
        record.daily_challenges = Some(generate_snapshot(today, templates));
    }

    let mut progress = ChallengeProgress::default();
    let Some(snapshot) = record.daily_challenges.as_mut() else {
        return progress;
    };

    snapshot.subjects_today.extend(game.subjects.iter().cloned());
    let distinct_subjects = snapshot.subjects_today.len() as u32;

    for challenge in snapshot.challenges.iter_mut().filter(|c| !c.completed) {
        match challenge.kind {
            ChallengeKind::Counter => {
                if game.correct > 0 {
                    challenge.progress = (challenge.progress + 1).min(challenge.goal);
                }
            }
            ChallengeKind::DistinctSubjects => {
                challenge.progress = distinct_subjects.min(challenge.goal);
            }
            ChallengeKind::Accuracy => {
                if game.reaches_accuracy(challenge.goal) == Some(true) {
                    challenge.progress = challenge.goal;
                }
            }
        }

        if challenge.progress >= challenge.goal {
            challenge.completed = true;
            challenge.completed_at = Some(now);
            progress.reward_total += challenge.reward;
            info!(
                "[CHALLENGE] {} completed for {} (+{})",
                challenge.id, record.user_id, challenge.reward
            );
            progress.completed.push(challenge.clone());
        }
    }

    progress
}
