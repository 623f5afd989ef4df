//! Daily streak tracking.
//!
//! Compares the event's calendar date with the record's last-played date.
//! The last-played date is written on every call, whichever branch runs.

use crate::record::UserProgressionRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of one streak update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    /// Bonus points offered to scoring (only on consecutive days)
    pub bonus: u64,
    /// Whether the streak length was (re)set this event
    pub updated: bool,
}

/// Advance the streak for an event on `today`
pub fn update_streak(
    record: &mut UserProgressionRecord,
    today: NaiveDate,
    bonus_per_day: u64,
) -> StreakUpdate {
    let update = match record.last_played_date {
        None => {
            record.streak_days = 1;
            debug!("[STREAK] first play, streak=1");
            StreakUpdate {
                bonus: 0,
                updated: true,
            }
        }
        Some(last) => {
            let delta = (today - last).num_days();
            if delta <= 0 {
                // Same day, or the clock went backwards
                StreakUpdate {
                    bonus: 0,
                    updated: false,
                }
            } else if delta == 1 {
                record.streak_days += 1;
                debug!("[STREAK] consecutive day, streak={}", record.streak_days);
                StreakUpdate {
                    bonus: record.streak_days as u64 * bonus_per_day,
                    updated: true,
                }
            } else {
                debug!(
                    "[STREAK] broken after {} days (was {})",
                    delta, record.streak_days
                );
                record.streak_days = 1;
                StreakUpdate {
                    bonus: 0,
                    updated: true,
                }
            }
        }
    };

    record.longest_streak = record.longest_streak.max(record.streak_days);
    record.last_played_date = Some(today);
    update
}

/// Streak as it stands on `today` without playing: still alive if the
/// learner played today or yesterday, 0 otherwise
pub fn live_streak(record: &UserProgressionRecord, today: NaiveDate) -> u32 {
    match record.last_played_date {
        Some(last) if (today - last).num_days() <= 1 => record.streak_days,
        _ => 0,
    }
}

/// True when the streak survives only if the learner plays today
pub fn streak_at_risk(record: &UserProgressionRecord, today: NaiveDate) -> bool {
    match record.last_played_date {
        Some(last) => record.streak_days > 0 && (today - last).num_days() == 1,
        None => false,
    }
}
