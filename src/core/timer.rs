//! In-memory timer session and the time arithmetic around it.
//!
//! A `TimerSession` is rebuilt on every activation, either from the durable
//! checkpoint or from fresh start input. All arithmetic is done on
//! `TimeDelta`; minutes are only rounded when something gets logged.

use crate::models::{CheckpointDraft, Phase, TimerCheckpoint};
use chrono::{DateTime, TimeDelta, Utc};

/// Upper bound accepted for either phase length.
pub const MAX_PHASE_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    pub phase: Phase,
    /// Work target while working; the minutes actually logged for the work
    /// phase once in the break.
    pub work_duration: i64,
    pub break_duration: i64,
    /// Work target chosen at start; survives a skip-to-break.
    pub original_work_duration: i64,
    /// Reference instant for the running stretch of the current phase, or
    /// the pause instant while paused.
    pub start_time: DateTime<Utc>,
    /// Running time accumulated before the last pause.
    pub elapsed: TimeDelta,
    pub paused: bool,
    pub running: bool,
    pub pending_session_id: Option<i64>,
    /// Version of the checkpoint row this session was last written as.
    pub version: Option<i64>,
}

impl TimerSession {
    pub fn new(work_minutes: i64, break_minutes: i64, now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Work,
            work_duration: work_minutes,
            break_duration: break_minutes,
            original_work_duration: work_minutes,
            start_time: now,
            elapsed: TimeDelta::zero(),
            paused: false,
            running: true,
            pending_session_id: None,
            version: None,
        }
    }

    /// Rehydrate from a checkpoint. A start time in the future counts as
    /// zero elapsed; a paused checkpoint comes back paused.
    pub fn from_checkpoint(cp: &TimerCheckpoint, now: DateTime<Utc>) -> Self {
        let (start_time, elapsed, paused) = match cp.paused_at {
            Some(at) => (at, (at - cp.start_time).max(TimeDelta::zero()), true),
            None => {
                let running = (now - cp.start_time).max(TimeDelta::zero());
                (now - running, TimeDelta::zero(), false)
            }
        };

        let (work_duration, break_duration) = match cp.phase {
            Phase::Work => (cp.duration_minutes, cp.break_duration),
            Phase::Break => (cp.original_work_duration, cp.duration_minutes),
        };

        Self {
            phase: cp.phase,
            work_duration,
            break_duration,
            original_work_duration: cp.original_work_duration,
            start_time,
            elapsed,
            paused,
            running: true,
            pending_session_id: cp.pending_session_id,
            version: Some(cp.version),
        }
    }

    pub fn phase_minutes(&self) -> i64 {
        match self.phase {
            Phase::Work => self.work_duration,
            Phase::Break => self.break_duration,
        }
    }

    pub fn phase_length(&self) -> TimeDelta {
        TimeDelta::minutes(self.phase_minutes())
    }

    /// Running time spent in the current phase; pauses do not count.
    pub fn total_elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        if self.paused || !self.running {
            self.elapsed
        } else {
            self.elapsed + (now - self.start_time).max(TimeDelta::zero())
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        self.phase_length() - self.total_elapsed(now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) <= TimeDelta::zero()
    }

    /// Durable start time equivalent to the current elapsed value.
    pub fn phase_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.total_elapsed(now)
    }

    /// Freeze the elapsed time. Returns the start time to persist.
    pub fn pause(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.elapsed = self.total_elapsed(now);
        self.paused = true;
        self.start_time = now;
        now - self.elapsed
    }

    /// Continue counting from `now`. Returns the start time to persist.
    pub fn resume(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.paused = false;
        self.start_time = now;
        now - self.elapsed
    }

    /// Switch to the break phase as if it had begun at `break_start`, after
    /// `work_minutes` of work.
    pub fn enter_break(&mut self, break_start: DateTime<Utc>, work_minutes: i64) {
        self.phase = Phase::Break;
        self.work_duration = work_minutes;
        self.start_time = break_start;
        self.elapsed = TimeDelta::zero();
        self.paused = false;
        self.running = true;
        self.pending_session_id = None;
    }

    pub fn draft(&self) -> CheckpointDraft {
        CheckpointDraft {
            phase: self.phase,
            duration_minutes: self.phase_minutes(),
            break_duration: self.break_duration,
            original_work_duration: self.original_work_duration,
            pending_session_id: self.pending_session_id,
        }
    }
}

/// Round to whole minutes, halves away from zero. Negative input counts as 0.
pub fn round_minutes(d: TimeDelta) -> i64 {
    let ms = d.num_milliseconds().max(0);
    (ms + 30_000) / 60_000
}

/// Minutes logged for a manual stop or skip: never less than one.
pub fn stop_minutes(d: TimeDelta) -> i64 {
    round_minutes(d).max(1)
}

/// `MM:SS` rounded up to the next second; negative values render as `00:00`.
pub fn format_remaining(d: TimeDelta) -> String {
    let secs = (d.num_milliseconds().max(0) + 999) / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
