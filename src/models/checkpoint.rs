//! Durable representation of the one active timer a user may have.

use crate::models::phase::Phase;
use chrono::{DateTime, Utc};

/// Only value ever stored in `active_timer.status`: the row's existence is
/// what marks a timer as active.
pub const RUNNING_STATUS: &str = "running";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCheckpoint {
    pub user_id: String,
    pub phase: Phase,
    /// UTC instant the current phase began, backdated by any time already
    /// spent in the phase before the last resume.
    pub start_time: DateTime<Utc>,
    /// Nominal length of the current phase.
    pub duration_minutes: i64,
    pub break_duration: i64,
    pub original_work_duration: i64,
    /// `sessions.id` of the row opened when the work phase ended.
    pub pending_session_id: Option<i64>,
    /// Set while the timer is paused. The elapsed time is frozen at
    /// `paused_at - start_time`.
    pub paused_at: Option<DateTime<Utc>>,
    pub status: String,
    pub version: i64,
}

/// Everything `put` writes except the key, the start time and the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointDraft {
    pub phase: Phase,
    pub duration_minutes: i64,
    pub break_duration: i64,
    pub original_work_duration: i64,
    pub pending_session_id: Option<i64>,
}

impl CheckpointDraft {
    pub fn work(work_minutes: i64, break_minutes: i64) -> Self {
        Self {
            phase: Phase::Work,
            duration_minutes: work_minutes,
            break_duration: break_minutes,
            original_work_duration: work_minutes,
            pending_session_id: None,
        }
    }

    pub fn break_phase(break_minutes: i64, original_work_minutes: i64) -> Self {
        Self {
            phase: Phase::Break,
            duration_minutes: break_minutes,
            break_duration: break_minutes,
            original_work_duration: original_work_minutes,
            pending_session_id: None,
        }
    }
}
