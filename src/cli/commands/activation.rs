//! Shared plumbing for the timer commands.
//!
//! Every invocation is a fresh activation: resolve the user, open the
//! database, reconcile the checkpoint, and only then run the command.

use crate::config::Config;
use crate::core::clock::SystemClock;
use crate::core::engine::{Reconciliation, TimerEngine, Transition};
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::core::timer::format_remaining;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

pub(crate) type CliEngine<'a> = TimerEngine<'a, DbPool, SystemClock>;

pub(crate) fn with_engine<T>(
    identity: &StaticIdentity,
    cfg: &Config,
    f: impl FnOnce(&DbPool, &mut CliEngine<'_>) -> AppResult<T>,
) -> AppResult<T> {
    let gate = IdentityGate::new(identity.clone());
    let user = gate.require()?;

    let pool = DbPool::open(&cfg.database)?;
    let clock = SystemClock;
    let mut engine = TimerEngine::new(user, &pool, &clock);

    let outcome = engine.reconcile();
    report_reconciliation(&pool, &engine, &outcome);
    flush_warnings(&mut engine);

    let result = f(&pool, &mut engine);
    flush_warnings(&mut engine);
    result
}

fn report_reconciliation(pool: &DbPool, engine: &CliEngine<'_>, outcome: &Reconciliation) {
    let user = engine.user().as_str();

    match outcome {
        Reconciliation::NoTimer | Reconciliation::Resumed { .. } => {}
        Reconciliation::BreakStarted {
            work_minutes,
            remaining,
        } => {
            info(format!(
                "Work phase finished while away ({} min logged). Break: {} left.",
                work_minutes,
                format_remaining(*remaining)
            ));
            ttlog_quiet(
                &pool.conn,
                "reconcile",
                user,
                &format!("work {work_minutes} min logged, break in progress"),
            );
        }
        Reconciliation::CycleCompleted {
            work_minutes,
            break_minutes,
        } => {
            success(format!(
                "A Pomodoro finished while away: {}",
                cycle_summary(*work_minutes, *break_minutes)
            ));
            ttlog_quiet(
                &pool.conn,
                "complete",
                user,
                &cycle_summary(*work_minutes, *break_minutes),
            );
        }
        Reconciliation::Failed(reason) => {
            warning(format!("Could not restore the running timer: {reason}"));
        }
    }
}

fn flush_warnings(engine: &mut CliEngine<'_>) {
    for w in engine.take_warnings() {
        warning(w);
    }
}

fn cycle_summary(work_minutes: Option<i64>, break_minutes: i64) -> String {
    match work_minutes {
        Some(w) => format!("work {w} min, break {break_minutes} min"),
        None => format!("break {break_minutes} min"),
    }
}

/// One-line, human-readable description of a transition.
pub(crate) fn describe(t: &Transition) -> String {
    match t {
        Transition::Started {
            work_minutes,
            break_minutes,
        } => format!("Pomodoro started: {work_minutes} min work, {break_minutes} min break."),
        Transition::Paused { phase, remaining } => {
            format!("{phase} paused with {} left.", format_remaining(*remaining))
        }
        Transition::Resumed { phase, remaining } => {
            format!("{phase} resumed, {} left.", format_remaining(*remaining))
        }
        Transition::Stopped { phase, minutes } => {
            format!("Stopped during {phase}; {minutes} min logged as early stop.")
        }
        Transition::SkippedToBreak {
            work_minutes,
            remaining,
        } => format!(
            "Skipped to break after {work_minutes} min of work. Break: {} left.",
            format_remaining(*remaining)
        ),
        Transition::BreakStarted {
            work_minutes,
            remaining,
        } => format!(
            "Work phase complete ({work_minutes} min). Break: {} left.",
            format_remaining(*remaining)
        ),
        Transition::CycleCompleted {
            work_minutes,
            break_minutes,
        } => format!(
            "Pomodoro complete: {}.",
            cycle_summary(*work_minutes, *break_minutes)
        ),
        Transition::Running {
            phase,
            remaining,
            paused,
        } => {
            if *paused {
                format!("{phase} (paused) {}", format_remaining(*remaining))
            } else {
                format!("{phase} {}", format_remaining(*remaining))
            }
        }
        Transition::Idle => "No active timer.".to_string(),
    }
}
