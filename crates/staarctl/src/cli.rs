//! Command-line surface.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "staarctl")]
#[command(about = "STAAR Prep - points, levels, streaks and badges for quiz practice", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: ~/.config/staar/config.toml, then /etc/staar/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep records in memory only; nothing is written
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// SQLite database path, overrides storage.db_path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Seed for mystery boxes, for reproducible runs
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long, global = true, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a single answer
    Answer {
        /// Learner id
        user: String,

        #[arg(long)]
        subject: Option<String>,

        /// The answer was wrong
        #[arg(long)]
        wrong: bool,

        /// Base points for this answer
        #[arg(long, allow_hyphen_values = true)]
        points: Option<i64>,

        /// Display name used if the learner is new
        #[arg(long)]
        name: Option<String>,
    },

    /// Record the last answer of a game together with the game result
    Game {
        /// Learner id
        user: String,

        #[arg(long)]
        subject: String,

        /// Correct answers in the game
        #[arg(long)]
        correct_count: u32,

        /// Questions in the game
        #[arg(long)]
        total: u32,

        /// The final answer was wrong
        #[arg(long)]
        last_wrong: bool,
    },

    /// Apply events from a JSON-lines file, one event per line
    Replay {
        file: PathBuf,
    },

    /// Show a learner's progress
    Show {
        user: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Highest-scoring learners
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the effective configuration
    Config,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp like 2026-03-02T16:00:00Z: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_game_with_globals() {
        let cli = Cli::try_parse_from([
            "staarctl",
            "--memory",
            "--seed",
            "7",
            "game",
            "kid",
            "--subject",
            "math",
            "--correct-count",
            "4",
            "--total",
            "5",
            "--at",
            "2026-03-02T16:00:00Z",
        ])
        .unwrap();

        assert!(cli.global.memory);
        assert_eq!(cli.global.seed, Some(7));
        assert!(cli.global.at.is_some());
        match cli.command {
            Commands::Game { user, correct_count, total, last_wrong, .. } => {
                assert_eq!(user, "kid");
                assert_eq!(correct_count, 4);
                assert_eq!(total, 5);
                assert!(!last_wrong);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_negative_points_accepted() {
        let cli = Cli::try_parse_from(["staarctl", "answer", "kid", "--points", "-5"]).unwrap();
        match cli.command {
            Commands::Answer { points, .. } => assert_eq!(points, Some(-5)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        assert!(Cli::try_parse_from(["staarctl", "--at", "yesterday", "show", "kid"]).is_err());
    }

    #[test]
    fn test_memory_conflicts_with_db() {
        assert!(Cli::try_parse_from(["staarctl", "--memory", "--db", "x.db", "config"]).is_err());
    }

    #[test]
    fn test_leaderboard_default_limit() {
        let cli = Cli::try_parse_from(["staarctl", "leaderboard"]).unwrap();
        match cli.command {
            Commands::Leaderboard { limit } => assert_eq!(limit, 10),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
