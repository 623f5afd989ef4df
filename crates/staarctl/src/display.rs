//! Terminal rendering for outcomes, profiles and the leaderboard.
//!
//! Every renderer returns a String so commands decide where it goes.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use staar_common::badges::{format_badge_strip, format_badge_unlock};
use staar_common::challenges::challenges_for;
use staar_common::levels::{level_title, next_reward, LevelProgress};
use staar_common::mystery_box::BoxReward;
use staar_common::streak::{live_streak, streak_at_risk};
use staar_common::{OutcomeSummary, StaarConfig, UserProgressionRecord};
use std::fmt::Write;

const BAR_WIDTH: usize = 20;
const SEPARATOR: &str = "----------------------------------------";

fn progress_bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// What happened on one event
pub fn render_outcome(
    record: &UserProgressionRecord,
    outcome: &OutcomeSummary,
    config: &StaarConfig,
) -> String {
    let mut out = String::new();

    if outcome.points_earned > 0 {
        let mut line = format!("+{} points", outcome.points_earned);
        if outcome.combo_bonus > 0 {
            line.push_str(&format!(
                " (combo {} x{} +{})",
                outcome.combo, outcome.combo_multiplier, outcome.combo_bonus
            ));
        }
        let _ = writeln!(out, "{}", line.bright_green());
    } else if outcome.combo == 0 {
        let _ = writeln!(out, "{}", "Combo reset. Keep trying!".yellow());
    }

    if outcome.streak_bonus > 0 {
        let _ = writeln!(
            out,
            "Streak: {} days (+{} bonus)",
            record.streak_days, outcome.streak_bonus
        );
    }

    if outcome.level_up {
        let _ = writeln!(
            out,
            "{} Level {} - {}",
            "LEVEL UP!".bright_magenta().bold(),
            outcome.level,
            level_title(outcome.level)
        );
    }

    for challenge in &outcome.completed_challenges {
        let _ = writeln!(
            out,
            "Challenge complete: {} (+{})",
            challenge.description, challenge.reward
        );
    }

    if let Some(drawn) = &outcome.mystery_box {
        let detail = match &drawn.reward {
            BoxReward::Points { amount } => format!("+{} points", amount),
            BoxReward::Badge { name, .. } => format!("badge {}", name),
            BoxReward::Message { text } => text.clone(),
        };
        let _ = writeln!(
            out,
            "{} {} {}: {}",
            drawn.icon,
            "Mystery box!".bright_cyan(),
            drawn.label,
            detail
        );
    }

    for badge in &outcome.new_badges {
        let _ = writeln!(out, "{}", format_badge_unlock(badge));
    }

    let _ = writeln!(
        out,
        "Total: {} points, level {}",
        record.total_points, record.current_level
    );
    if let Some(next) = next_reward(record.total_points, &config.rewards) {
        let _ = writeln!(
            out,
            "{}",
            format!(
                "{} points to go for: {} {}",
                next.points_to_go, next.milestone.icon, next.milestone.reward
            )
            .dimmed()
        );
    }

    out
}

/// Full learner card
pub fn render_profile(
    record: &UserProgressionRecord,
    config: &StaarConfig,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    let progress = LevelProgress::for_record(record, config.engine.points_per_level);

    let _ = writeln!(out, "{}", record.display_name.bold());
    let _ = writeln!(out, "{}", SEPARATOR.dimmed());
    let _ = writeln!(
        out,
        "Level:     {} - {}",
        progress.level,
        progress.title.bright_cyan()
    );
    let _ = writeln!(
        out,
        "Progress:  {} {}% ({} to next level)",
        progress_bar(progress.percent),
        progress.percent,
        progress.points_to_next
    );
    let _ = writeln!(out, "Points:    {}", record.total_points);
    let _ = writeln!(
        out,
        "Accuracy:  {}% ({}/{})",
        record.accuracy_percent(),
        record.correct_answers,
        record.questions_answered
    );

    let streak = live_streak(record, today);
    let mut streak_line = format!("Streak:    {} days (best {})", streak, record.longest_streak);
    if streak_at_risk(record, today) {
        streak_line.push_str(&format!(" {}", "play today to keep it!".yellow()));
    }
    let _ = writeln!(out, "{}", streak_line);
    let _ = writeln!(
        out,
        "Combo:     {} (best {})",
        record.current_combo, record.max_combo
    );

    if !record.subjects_completed.is_empty() {
        let subjects: Vec<String> = record
            .subjects_completed
            .iter()
            .map(|(subject, games)| format!("{} {}", subject, games))
            .collect();
        let _ = writeln!(out, "Games:     {}", subjects.join(", "));
    }

    if !record.badges.is_empty() {
        let _ = writeln!(
            out,
            "Badges:    {} ({})",
            format_badge_strip(&record.badges, 8),
            record.badges.len()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[TODAY]");
    let snapshot = challenges_for(record, today, &config.challenges.templates);
    for challenge in &snapshot.challenges {
        let mark = if challenge.completed {
            "[x]".bright_green().to_string()
        } else {
            "[ ]".to_string()
        };
        let _ = writeln!(
            out,
            "  {} {} ({}/{}, +{})",
            mark, challenge.description, challenge.progress, challenge.goal, challenge.reward
        );
    }

    if let Some(next) = next_reward(record.total_points, &config.rewards) {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Next reward: {} {} in {} points",
            next.milestone.icon, next.milestone.reward, next.points_to_go
        );
    }

    out
}

/// Ranked table, one line per learner
pub fn render_leaderboard(records: &[UserProgressionRecord]) -> String {
    if records.is_empty() {
        return "No learners yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "[LEADERBOARD]");
    for (i, record) in records.iter().enumerate() {
        let rank = format!("{:>2}.", i + 1);
        let _ = writeln!(
            out,
            "{} {:<20} {:>7} pts  level {} ({})",
            if i == 0 { rank.bright_yellow().to_string() } else { rank },
            record.display_name,
            record.total_points,
            record.current_level,
            level_title(record.current_level)
        );
    }
    out
}
