//! Analytics over a user's session log.
//!
//! Everything here is a pure function of the rows passed in; the caller
//! decides which slice of the log to load. Days and hours are UTC.

use crate::models::{SessionRecord, SessionStatus};
use chrono::{Datelike, NaiveDate, TimeDelta, Timelike};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_sessions: usize,
    pub total_work_minutes: i64,
    pub total_break_minutes: i64,
    /// Mean of the per-row efficiency; rows with no minutes are left out.
    pub average_efficiency: Option<f64>,
    pub completed_sessions: usize,
    pub completed_minutes: i64,
    pub early_stop_sessions: usize,
    pub early_stop_minutes: i64,
    /// Rows still waiting for their break.
    pub pending_sessions: usize,
}

impl Summary {
    pub fn total_minutes(&self) -> i64 {
        self.total_work_minutes + self.total_break_minutes
    }

    pub fn work_percent(&self) -> Option<f64> {
        let total = self.total_minutes();
        (total > 0).then(|| self.total_work_minutes as f64 / total as f64 * 100.0)
    }

    pub fn break_percent(&self) -> Option<f64> {
        self.work_percent().map(|w| 100.0 - w)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyFocus {
    pub date: NaiveDate,
    pub sessions: usize,
    pub completed: usize,
    pub work_minutes: i64,
    pub break_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyWork {
    pub iso_year: i32,
    pub iso_week: u32,
    pub work_minutes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

pub fn summarize(records: &[SessionRecord]) -> Summary {
    let mut s = Summary {
        total_sessions: records.len(),
        ..Summary::default()
    };

    let mut eff_sum = 0.0;
    let mut eff_count = 0usize;

    for r in records {
        s.total_work_minutes += r.work_minutes;
        s.total_break_minutes += r.break_minutes;

        if let Some(e) = r.efficiency() {
            eff_sum += e;
            eff_count += 1;
        }

        match r.status {
            SessionStatus::Completed => {
                s.completed_sessions += 1;
                s.completed_minutes += r.total_minutes();
            }
            SessionStatus::EarlyStop => {
                s.early_stop_sessions += 1;
                s.early_stop_minutes += r.total_minutes();
            }
            SessionStatus::WorkCompletePendingBreak => s.pending_sessions += 1,
        }
    }

    if eff_count > 0 {
        s.average_efficiency = Some(eff_sum / eff_count as f64);
    }
    s
}

/// Per-day totals, oldest day first.
pub fn daily_breakdown(records: &[SessionRecord]) -> Vec<DailyFocus> {
    let mut days: BTreeMap<NaiveDate, DailyFocus> = BTreeMap::new();

    for r in records {
        let date = r.timestamp.date_naive();
        let day = days.entry(date).or_insert_with(|| DailyFocus {
            date,
            sessions: 0,
            completed: 0,
            work_minutes: 0,
            break_minutes: 0,
        });
        day.sessions += 1;
        if r.status == SessionStatus::Completed {
            day.completed += 1;
        }
        day.work_minutes += r.work_minutes;
        day.break_minutes += r.break_minutes;
    }

    days.into_values().collect()
}

/// Work minutes per ISO week, oldest week first.
pub fn weekly_work(records: &[SessionRecord]) -> Vec<WeeklyWork> {
    let mut weeks: BTreeMap<(i32, u32), i64> = BTreeMap::new();

    for r in records {
        let w = r.timestamp.iso_week();
        *weeks.entry((w.year(), w.week())).or_default() += r.work_minutes;
    }

    weeks
        .into_iter()
        .map(|((iso_year, iso_week), work_minutes)| WeeklyWork {
            iso_year,
            iso_week,
            work_minutes,
        })
        .collect()
}

/// Number of sessions logged in each hour of the day.
pub fn hourly_counts(records: &[SessionRecord]) -> [usize; 24] {
    let mut hours = [0usize; 24];
    for r in records {
        hours[r.timestamp.hour() as usize] += 1;
    }
    hours
}

/// Runs of consecutive days with at least one completed session.
///
/// The current streak counts back from `today`, or from yesterday when
/// nothing has been completed today yet.
pub fn streaks(records: &[SessionRecord], today: NaiveDate) -> Streaks {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| r.status == SessionStatus::Completed)
        .map(|r| r.timestamp.date_naive())
        .collect();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &d in &days {
        run = match prev {
            Some(p) if d - p == TimeDelta::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }

    let mut current = 0u32;
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|y| days.contains(y))
    };
    while let Some(d) = cursor {
        if !days.contains(&d) {
            break;
        }
        current += 1;
        cursor = d.pred_opt();
    }

    Streaks { current, longest }
}

/// Hour with the most sessions, earliest on ties.
pub fn peak_hour(hours: &[usize; 24]) -> Option<u32> {
    let max = *hours.iter().max()?;
    if max == 0 {
        return None;
    }
    hours.iter().position(|&n| n == max).map(|h| h as u32)
}
