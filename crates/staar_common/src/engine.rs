//! Progression engine.
//!
//! Runs one event against one record:
//!
//! 1. streak (its bonus feeds scoring)
//! 2. scoring: counters, combo, points, level
//! 3. game bookkeeping: subject count, perfect-game count
//! 4. daily challenges (finished games only)
//! 5. mystery box (finished games only)
//! 6. level re-check for points credited by 4 and 5
//! 7. badges, against the fully updated record
//!
//! Time and randomness are supplied by the caller; nothing in here reads the
//! clock or a global RNG.

use crate::badges::{evaluate_badges, BadgeContext};
use crate::challenges::update_daily_challenges;
use crate::config::{ChallengeConfig, EngineConfig, StaarConfig};
use crate::event::ProgressEvent;
use crate::mystery_box::{self, MysteryBox, MysteryBoxConfig};
use crate::record::{Badge, ChallengeInstance, UserProgressionRecord};
use crate::scoring::{check_level_up, score_answer};
use crate::streak::update_streak;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything the caller needs to show after an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub level_up: bool,
    pub levels_gained: u32,
    pub level: u32,
    /// Points credited by the answer itself (base + combo + streak)
    pub points_earned: u64,
    pub new_badges: Vec<Badge>,
    pub streak_bonus: u64,
    pub streak_updated: bool,
    pub combo: u32,
    pub combo_multiplier: f64,
    pub combo_bonus: u64,
    pub mystery_box: Option<MysteryBox>,
    pub challenge_rewards: u64,
    pub completed_challenges: Vec<ChallengeInstance>,
}

impl OutcomeSummary {
    /// All points added to the total by this event
    pub fn total_points_gained(&self) -> u64 {
        let box_points = self.mystery_box.as_ref().map_or(0, |b| b.points_awarded);
        self.points_earned + self.challenge_rewards + box_points
    }
}

/// Stateless rules over a record; cheap to share
#[derive(Debug, Clone, Default)]
pub struct ProgressionEngine {
    engine: EngineConfig,
    challenges: ChallengeConfig,
    mystery_box: MysteryBoxConfig,
}

impl ProgressionEngine {
    pub fn new(
        engine: EngineConfig,
        challenges: ChallengeConfig,
        mystery_box: MysteryBoxConfig,
    ) -> Self {
        Self {
            engine,
            challenges,
            mystery_box,
        }
    }

    pub fn from_config(config: &StaarConfig) -> Self {
        Self::new(
            config.engine.clone(),
            config.challenges.clone(),
            config.mystery_box.clone(),
        )
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn challenge_config(&self) -> &ChallengeConfig {
        &self.challenges
    }

    pub fn mystery_box_config(&self) -> &MysteryBoxConfig {
        &self.mystery_box
    }

    /// Apply one event to a record in place
    pub fn apply_event<R: Rng + ?Sized>(
        &self,
        record: &mut UserProgressionRecord,
        event: &ProgressEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> OutcomeSummary {
        let cfg = &self.engine;

        let streak = update_streak(record, now.date_naive(), cfg.streak_bonus_per_day);

        let base_points = event.base_points(cfg.default_base_points);
        let score = score_answer(record, event.correct, base_points, streak.bonus, cfg);
        let mut levels_gained = score.levels_gained;

        let game = event.game_result();
        let mut challenge_rewards = 0;
        let mut completed_challenges = Vec::new();
        let mut drawn_box = None;

        if let Some(game) = &game {
            for subject in &game.subjects {
                if !cfg.is_known_subject(subject) {
                    warn!("[EVENT] unknown subject '{}' for {}", subject, record.user_id);
                }
                *record.subjects_completed.entry(subject.clone()).or_insert(0) += 1;
            }
            if game.perfect {
                record.perfect_games += 1;
            }

            let progress =
                update_daily_challenges(record, game, now, &self.challenges.templates);
            record.total_points = record.total_points.saturating_add(progress.reward_total);
            challenge_rewards = progress.reward_total;
            completed_challenges = progress.completed;

            drawn_box = mystery_box::draw(record, &self.mystery_box, now, rng);
        }

        let remaining = cfg
            .level_up_policy
            .budget()
            .map(|b| b.saturating_sub(levels_gained));
        if remaining != Some(0) {
            levels_gained += check_level_up(record, cfg.points_per_level, remaining);
        }
        if levels_gained > 0 {
            info!(
                "[SCORE] {} reached level {} ({} points)",
                record.user_id, record.current_level, record.total_points
            );
        }

        let ctx = BadgeContext {
            perfect_game: game.as_ref().map_or(false, |g| g.perfect),
        };
        let new_badges = evaluate_badges(record, ctx, cfg, now);
        record.badges.extend(new_badges.iter().cloned());

        record.last_played = Some(now);

        OutcomeSummary {
            level_up: levels_gained > 0,
            levels_gained,
            level: record.current_level,
            points_earned: score.points_earned,
            new_badges,
            streak_bonus: streak.bonus,
            streak_updated: streak.updated,
            combo: score.combo,
            combo_multiplier: score.multiplier,
            combo_bonus: score.combo_bonus,
            mystery_box: drawn_box,
            challenge_rewards,
            completed_challenges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::LevelUpPolicy;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 16, 30, 0).unwrap()
    }

    fn no_boxes() -> ProgressionEngine {
        ProgressionEngine::new(
            EngineConfig::default(),
            ChallengeConfig::default(),
            MysteryBoxConfig {
                trigger_chance: 0.0,
                ..Default::default()
            },
        )
    }

    fn fresh() -> UserProgressionRecord {
        UserProgressionRecord::new("kid", None, now())
    }

    #[test]
    fn test_first_correct_answer() {
        let engine = no_boxes();
        let mut rec = fresh();
        let mut rng = StdRng::seed_from_u64(1);

        let out = engine.apply_event(&mut rec, &ProgressEvent::answer(true), now(), &mut rng);
        assert!(out.streak_updated);
        assert_eq!(out.streak_bonus, 0);
        assert_eq!(out.points_earned, 10);
        assert_eq!(out.combo, 1);
        assert_eq!(out.new_badges.len(), 1);
        assert_eq!(out.new_badges[0].id, "first_win");
        assert!(out.mystery_box.is_none());
        assert!(out.completed_challenges.is_empty());

        assert_eq!(rec.total_points, 10);
        assert_eq!(rec.badges.len(), 1);
        assert_eq!(rec.last_played, Some(now()));
        assert_eq!(rec.last_played_date, Some(now().date_naive()));
        assert!(rec.daily_challenges.is_none());
    }

    #[test]
    fn test_level_up_exactly_at_300() {
        let engine = no_boxes();
        let mut rec = fresh();
        rec.total_points = 290;
        rec.questions_answered = 40;
        rec.correct_answers = 20;
        rec.last_played_date = Some(now().date_naive());
        let mut rng = StdRng::seed_from_u64(1);

        let out = engine.apply_event(&mut rec, &ProgressEvent::answer(true), now(), &mut rng);
        assert_eq!(rec.total_points, 300);
        assert!(out.level_up);
        assert_eq!(out.level, 2);
        assert_eq!(rec.current_level, 2);
    }

    #[test]
    fn test_challenge_reward_can_level_up() {
        let engine = no_boxes();
        let mut rec = fresh();
        rec.total_points = 250;
        rec.questions_answered = 40;
        rec.correct_answers = 20;
        rec.last_played_date = Some(now().date_naive());
        let mut rng = StdRng::seed_from_u64(1);

        // 10 base + 100 accuracy reward crosses 300
        let event = ProgressEvent::answer(true).with_subject("math").finishing_game(4, 5);
        let out = engine.apply_event(&mut rec, &event, now(), &mut rng);
        assert_eq!(out.challenge_rewards, 100);
        assert!(out.level_up);
        assert_eq!(rec.current_level, 2);
        assert_eq!(rec.total_points, 360);
        assert_eq!(out.total_points_gained(), 110);
    }

    #[test]
    fn test_single_policy_one_level_per_event() {
        let engine = no_boxes();
        let mut rec = fresh();
        rec.last_played_date = Some(now().date_naive());
        let mut rng = StdRng::seed_from_u64(1);

        let out = engine.apply_event(
            &mut rec,
            &ProgressEvent::answer(true).with_points(1000),
            now(),
            &mut rng,
        );
        assert_eq!(out.levels_gained, 1);
        assert_eq!(rec.current_level, 2);
    }

    #[test]
    fn test_max_base_points_never_overflow() {
        let engine = ProgressionEngine::default();
        let mut rec = fresh();
        let mut rng = StdRng::seed_from_u64(1);
        let event = ProgressEvent::answer(true).with_points(i64::MAX);

        for _ in 0..5 {
            engine.apply_event(&mut rec, &event, now(), &mut rng);
        }
        assert_eq!(rec.total_points, u64::MAX);
        assert_eq!(rec.current_combo, 5);
        assert_eq!(rec.current_level, 6);
    }

    #[test]
    fn test_cascade_policy_jumps_levels() {
        let mut cfg = EngineConfig::default();
        cfg.level_up_policy = LevelUpPolicy::Cascade;
        let engine = ProgressionEngine::new(
            cfg,
            ChallengeConfig::default(),
            MysteryBoxConfig {
                trigger_chance: 0.0,
                ..Default::default()
            },
        );
        let mut rec = fresh();
        rec.last_played_date = Some(now().date_naive());
        let mut rng = StdRng::seed_from_u64(1);

        let out = engine.apply_event(
            &mut rec,
            &ProgressEvent::answer(true).with_points(1000),
            now(),
            &mut rng,
        );
        assert_eq!(out.levels_gained, 3);
        assert_eq!(rec.current_level, 4);
    }

    #[test]
    fn test_perfect_game_counts_and_badge() {
        let engine = no_boxes();
        let mut rec = fresh();
        let mut rng = StdRng::seed_from_u64(1);

        let event = ProgressEvent::answer(true).with_subject("reading").finishing_game(5, 5);
        let out = engine.apply_event(&mut rec, &event, now(), &mut rng);
        assert_eq!(rec.perfect_games, 1);
        assert_eq!(rec.subject_count("reading"), 1);
        assert!(out.new_badges.iter().any(|b| b.id == "perfect_1"));
    }

    #[test]
    fn test_perfect_flag_ignored_without_game() {
        let engine = no_boxes();
        let mut rec = fresh();
        let mut rng = StdRng::seed_from_u64(1);

        let event = ProgressEvent {
            correct: true,
            perfect_game: true,
            ..Default::default()
        };
        let out = engine.apply_event(&mut rec, &event, now(), &mut rng);
        assert_eq!(rec.perfect_games, 0);
        assert!(!out.new_badges.iter().any(|b| b.id.starts_with("perfect_")));
    }

    #[test]
    fn test_wrong_answer_keeps_streak_bonus_uncredited() {
        let engine = no_boxes();
        let mut rec = fresh();
        rec.streak_days = 2;
        rec.last_played_date = Some((now() - Duration::days(1)).date_naive());
        let mut rng = StdRng::seed_from_u64(1);

        let out = engine.apply_event(&mut rec, &ProgressEvent::answer(false), now(), &mut rng);
        assert_eq!(out.streak_bonus, 30);
        assert!(out.streak_updated);
        assert_eq!(out.points_earned, 0);
        assert_eq!(rec.total_points, 0);
        assert_eq!(rec.streak_days, 3);
    }

    #[test]
    fn test_box_always_on_finished_game() {
        let engine = ProgressionEngine::new(
            EngineConfig::default(),
            ChallengeConfig::default(),
            MysteryBoxConfig {
                trigger_chance: 1.0,
                ..Default::default()
            },
        );
        let mut rec = fresh();
        let mut rng = StdRng::seed_from_u64(5);

        let out = engine.apply_event(&mut rec, &ProgressEvent::answer(true), now(), &mut rng);
        assert!(out.mystery_box.is_none());

        let event = ProgressEvent::answer(true).with_subject("math").finishing_game(2, 5);
        let out = engine.apply_event(&mut rec, &event, now(), &mut rng);
        assert!(out.mystery_box.is_some());
        assert_eq!(rec.mystery_boxes_opened, 1);
    }
}
