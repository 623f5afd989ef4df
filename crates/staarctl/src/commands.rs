//! Command handlers.

use crate::cli::{Commands, GlobalArgs};
use crate::display;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staar_common::config::StorageBackend;
use staar_common::{
    open_store, OutcomeSummary, ProgressEvent, ProgressStore, ProgressionEngine,
    ProgressionService, StaarConfig, UserProgressionRecord,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One line of a replay file: a user id, an optional timestamp and the
/// event fields inline
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayLine {
    pub user_id: String,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

#[derive(Debug, Serialize)]
struct EventReport<'a> {
    user_id: &'a str,
    record: &'a UserProgressionRecord,
    outcome: &'a OutcomeSummary,
}

#[derive(Debug, Serialize)]
struct LeaderboardEntry<'a> {
    rank: usize,
    user_id: &'a str,
    display_name: &'a str,
    total_points: u64,
    level: u32,
    title: &'static str,
}

/// Everything a command needs: effective config, service and clock
pub struct Session {
    pub config: StaarConfig,
    pub service: ProgressionService<Box<dyn ProgressStore>>,
    pub now: DateTime<Utc>,
    pub json: bool,
}

impl Session {
    /// Apply global flags on top of the loaded config and open the store
    pub fn open(mut config: StaarConfig, global: &GlobalArgs) -> Result<Self> {
        if global.memory {
            config.storage.backend = StorageBackend::Memory;
        }
        if let Some(db) = &global.db {
            config.storage.backend = StorageBackend::Sqlite;
            config.storage.db_path = db.clone();
        }

        let store = open_store(&config.storage).with_context(|| {
            format!(
                "Failed to open {:?} store at {}",
                config.storage.backend,
                config.storage.db_path.display()
            )
        })?;
        let engine = ProgressionEngine::from_config(&config);
        let service = match global.seed {
            Some(seed) => {
                debug!("mystery boxes seeded with {}", seed);
                ProgressionService::seeded(store, engine, seed)
            }
            None => ProgressionService::new(store, engine),
        };

        Ok(Self {
            config,
            service,
            now: global.at.unwrap_or_else(Utc::now),
            json: global.json,
        })
    }
}

/// Run one subcommand
pub fn run(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Answer { user, subject, wrong, points, name } => {
            let mut event = ProgressEvent::answer(!wrong);
            event.subject = subject;
            event.base_points = points;
            answer(session, &user, name.as_deref(), &event)
        }
        Commands::Game { user, subject, correct_count, total, last_wrong } => {
            let event = ProgressEvent::answer(!last_wrong)
                .with_subject(&subject)
                .finishing_game(correct_count, total);
            answer(session, &user, None, &event)
        }
        Commands::Replay { file } => replay(session, &file),
        Commands::Show { user, name } => show(session, &user, name.as_deref()),
        Commands::Leaderboard { limit } => leaderboard(session, limit),
        Commands::Config => print_config(&session.config),
    }
}

fn answer(
    session: &Session,
    user: &str,
    name: Option<&str>,
    event: &ProgressEvent,
) -> Result<()> {
    if name.is_some() {
        session.service.get_or_create(user, name, session.now)?;
    }
    let (record, outcome) = session.service.apply_event(user, event, session.now)?;

    if session.json {
        let report = EventReport {
            user_id: user,
            record: &record,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", display::render_outcome(&record, &outcome, &session.config));
    }
    Ok(())
}

/// Parse a JSON-lines event log, skipping blank lines
pub fn parse_replay(contents: &str) -> Result<Vec<ReplayLine>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<ReplayLine>(line)
                .with_context(|| format!("Invalid event on line {}", i + 1))
        })
        .collect()
}

fn replay(session: &Session, file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let lines = parse_replay(&contents)?;

    let mut applied = 0usize;
    let mut level_ups = 0u32;
    let mut badges = 0usize;
    for line in &lines {
        let now = line.at.unwrap_or(session.now);
        let (record, outcome) = session.service.apply_event(&line.user_id, &line.event, now)?;
        applied += 1;
        level_ups += outcome.levels_gained;
        badges += outcome.new_badges.len();

        if session.json {
            let report = EventReport {
                user_id: &line.user_id,
                record: &record,
                outcome: &outcome,
            };
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    info!("replayed {} events from {}", applied, file.display());
    if !session.json {
        println!(
            "Replayed {} events: {} level ups, {} badges",
            applied, level_ups, badges
        );
    }
    Ok(())
}

fn show(session: &Session, user: &str, name: Option<&str>) -> Result<()> {
    let record = session.service.get_or_create(user, name, session.now)?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!(
            "{}",
            display::render_profile(&record, &session.config, session.now.date_naive())
        );
    }
    Ok(())
}

fn leaderboard(session: &Session, limit: usize) -> Result<()> {
    let top = session.service.top_n(limit)?;
    if session.json {
        let entries: Vec<LeaderboardEntry> = top
            .iter()
            .enumerate()
            .map(|(i, r)| LeaderboardEntry {
                rank: i + 1,
                user_id: &r.user_id,
                display_name: &r.display_name,
                total_points: r.total_points,
                level: r.current_level,
                title: staar_common::levels::level_title(r.current_level),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", display::render_leaderboard(&top));
    }
    Ok(())
}

fn print_config(config: &StaarConfig) -> Result<()> {
    let text = config.to_toml().context("Failed to render configuration")?;
    print!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory_session() -> Session {
        let global = GlobalArgs {
            memory: true,
            seed: Some(5),
            ..Default::default()
        };
        Session::open(StaarConfig::default(), &global).unwrap()
    }

    #[test]
    fn test_parse_replay_lines() {
        let lines = parse_replay(
            r#"
{"user_id": "kid", "correct": true, "subject": "math"}

{"user_id": "kid", "at": "2026-03-03T10:00:00Z", "correct": false, "game_completed": true, "correct_count": 3, "total_questions": 5}
"#,
        )
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].event.correct);
        assert!(lines[0].at.is_none());
        assert!(lines[1].event.game_completed);
        assert_eq!(lines[1].event.total_questions, Some(5));
        assert!(lines[1].at.is_some());
    }

    #[test]
    fn test_parse_replay_reports_line_number() {
        let err = parse_replay("{\"user_id\": \"a\"}\nnot json\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_memory_flag_overrides_config() {
        let session = memory_session();
        assert_eq!(session.config.storage.backend, StorageBackend::Memory);
        assert_eq!(session.service.store().backend_name(), "memory");
    }

    #[test]
    fn test_db_flag_uses_sqlite_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cli.db");
        let global = GlobalArgs {
            db: Some(path.clone()),
            ..Default::default()
        };
        let session = Session::open(StaarConfig::default(), &global).unwrap();
        assert_eq!(session.service.store().backend_name(), "sqlite");
        assert!(path.exists());
    }

    #[test]
    fn test_run_answer_and_leaderboard() {
        let session = memory_session();
        run(
            &session,
            Commands::Answer {
                user: "kid".into(),
                subject: Some("math".into()),
                wrong: false,
                points: Some(20),
                name: Some("Maya".into()),
            },
        )
        .unwrap();

        let top = session.service.top_n(10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].display_name, "Maya");
        assert_eq!(top[0].total_points, 20);

        run(&session, Commands::Leaderboard { limit: 10 }).unwrap();
    }
}
