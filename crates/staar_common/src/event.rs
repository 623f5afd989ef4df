//! Input events and their normalization.
//!
//! Events arrive from the transport layer already authenticated. Anything
//! malformed is defaulted here so the engine never has to fail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// One answer, optionally closing a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub correct: bool,
    /// Points for this answer; missing or negative means the configured default
    #[serde(default, alias = "points")]
    pub base_points: Option<i64>,
    #[serde(default)]
    pub game_completed: bool,
    #[serde(default)]
    pub correct_count: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub perfect_game: bool,
}

/// Aggregate outcome of a finished game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub correct: u32,
    /// 0 only when the caller explicitly sent 0
    pub total: u32,
    pub perfect: bool,
    pub subjects: BTreeSet<String>,
}

impl GameResult {
    /// Accuracy percent, None when the game had no questions
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.correct as f64 / self.total as f64 * 100.0)
    }

    /// Whether the game reached `percent` accuracy, compared in integers so
    /// exact hits count. None when the game had no questions.
    pub fn reaches_accuracy(&self, percent: u32) -> Option<bool> {
        if self.total == 0 {
            return None;
        }
        Some(self.correct as u64 * 100 >= percent as u64 * self.total as u64)
    }
}

impl ProgressEvent {
    /// A single answer
    pub fn answer(correct: bool) -> Self {
        Self {
            correct,
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.base_points = Some(points);
        self
    }

    /// Mark this answer as the last one of a game
    pub fn finishing_game(mut self, correct_count: u32, total_questions: u32) -> Self {
        self.game_completed = true;
        self.correct_count = Some(correct_count);
        self.total_questions = Some(total_questions);
        self.perfect_game = total_questions > 0 && correct_count == total_questions;
        self
    }

    /// Base points with the default applied to missing or negative values
    pub fn base_points(&self, default_points: u64) -> u64 {
        match self.base_points {
            Some(p) if p >= 0 => p as u64,
            _ => default_points,
        }
    }

    /// Lowercased subject, None if absent or blank
    pub fn subject(&self) -> Option<String> {
        self.subject
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Normalized game aggregate, None unless the event closes a game
    pub fn game_result(&self) -> Option<GameResult> {
        if !self.game_completed {
            return None;
        }

        if self.correct_count.is_none() || self.total_questions.is_none() {
            warn!(
                "[EVENT] game completed without counts (correct={:?}, total={:?}), defaulting",
                self.correct_count, self.total_questions
            );
        }

        let correct = self.correct_count.unwrap_or(0);
        let total = match self.total_questions {
            Some(total) => total,
            None => correct.max(1),
        };
        let correct = correct.min(total);

        Some(GameResult {
            correct,
            total,
            perfect: self.perfect_game,
            subjects: self.subject().into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_points_default() {
        assert_eq!(ProgressEvent::answer(true).base_points(10), 10);
        assert_eq!(ProgressEvent::answer(true).with_points(-5).base_points(10), 10);
        assert_eq!(ProgressEvent::answer(true).with_points(0).base_points(10), 0);
        assert_eq!(ProgressEvent::answer(true).with_points(25).base_points(10), 25);
    }

    #[test]
    fn test_subject_normalization() {
        assert_eq!(
            ProgressEvent::answer(true).with_subject(" Math ").subject(),
            Some("math".to_string())
        );
        assert_eq!(ProgressEvent::answer(true).with_subject("  ").subject(), None);
        assert_eq!(ProgressEvent::answer(true).subject(), None);
    }

    #[test]
    fn test_single_answer_has_no_game() {
        assert!(ProgressEvent::answer(true).game_result().is_none());
    }

    #[test]
    fn test_finishing_game_sets_perfect() {
        let event = ProgressEvent::answer(true).finishing_game(5, 5);
        let game = event.game_result().unwrap();
        assert!(game.perfect);
        assert_eq!(game.accuracy(), Some(100.0));

        let event = ProgressEvent::answer(false).finishing_game(3, 5);
        assert!(!event.game_result().unwrap().perfect);
    }

    #[test]
    fn test_malformed_game_defaults() {
        let event = ProgressEvent {
            game_completed: true,
            ..Default::default()
        };
        let game = event.game_result().unwrap();
        assert_eq!(game.correct, 0);
        assert_eq!(game.total, 1);
        assert_eq!(game.accuracy(), Some(0.0));

        let event = ProgressEvent {
            game_completed: true,
            correct_count: Some(4),
            ..Default::default()
        };
        let game = event.game_result().unwrap();
        assert_eq!(game.total, 4);
    }

    #[test]
    fn test_explicit_zero_total_has_no_accuracy() {
        let event = ProgressEvent {
            game_completed: true,
            correct_count: Some(3),
            total_questions: Some(0),
            ..Default::default()
        };
        let game = event.game_result().unwrap();
        assert_eq!(game.correct, 0);
        assert_eq!(game.accuracy(), None);
    }

    #[test]
    fn test_reaches_accuracy_exact() {
        let game = ProgressEvent::answer(true).finishing_game(57, 100).game_result().unwrap();
        assert_eq!(game.reaches_accuracy(57), Some(true));
        assert_eq!(game.reaches_accuracy(58), Some(false));

        let empty = ProgressEvent::answer(true).finishing_game(0, 0).game_result().unwrap();
        assert_eq!(empty.reaches_accuracy(0), None);
    }

    #[test]
    fn test_points_alias() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"correct": true, "points": 20, "subject": "reading"}"#)
                .unwrap();
        assert_eq!(event.base_points(10), 20);
        assert!(!event.game_completed);
    }
}
