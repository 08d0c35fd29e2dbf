//! The work/break state machine.
//!
//! `TimerEngine` owns the in-memory [`TimerSession`] of one activation and
//! keeps the durable checkpoint in step with it. Every activation starts with
//! [`TimerEngine::reconcile`], which replays whatever happened while no client
//! was watching.
//!
//! Storage failures on ordinary transitions do not stop the timer: they are
//! collected as warnings (see [`TimerEngine::take_warnings`]) and the local
//! state moves on. A version conflict is different: another client moved the
//! timer, so the local session is thrown away and reloaded from the store.
//! Reconciliation is stricter: any failure aborts it, the local state drops
//! back to idle and the next activation tries again.

use crate::core::clock::Clock;
use crate::core::identity::{IdentityGate, IdentityProvider, UserId};
use crate::core::timer::{MAX_PHASE_MINUTES, TimerSession, stop_minutes};
use crate::db::checkpoint::CheckpointStore;
use crate::db::sessions::SessionLog;
use crate::errors::{AppError, AppResult};
use crate::models::{CheckpointDraft, Phase, SessionStatus};
use chrono::{DateTime, TimeDelta, Utc};

/// Times reconciliation re-reads the checkpoint after losing a race.
pub const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// Storage the engine needs: the checkpoint row and the session log.
pub trait TimerStore: CheckpointStore + SessionLog {}

impl<T: CheckpointStore + SessionLog + ?Sized> TimerStore for T {}

/// Result of a user action or a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started {
        work_minutes: i64,
        break_minutes: i64,
    },
    Paused {
        phase: Phase,
        remaining: TimeDelta,
    },
    Resumed {
        phase: Phase,
        remaining: TimeDelta,
    },
    Stopped {
        phase: Phase,
        minutes: i64,
    },
    SkippedToBreak {
        work_minutes: i64,
        remaining: TimeDelta,
    },
    /// Work ran out; the break is now counting down.
    BreakStarted {
        work_minutes: i64,
        remaining: TimeDelta,
    },
    /// The cycle is over and logged. `work_minutes` is known only when the
    /// work phase was logged in the same step.
    CycleCompleted {
        work_minutes: Option<i64>,
        break_minutes: i64,
    },
    /// Nothing to do yet.
    Running {
        phase: Phase,
        remaining: TimeDelta,
        paused: bool,
    },
    Idle,
}

/// Outcome of catching up with the durable checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    NoTimer,
    /// The phase is still in progress and has been rehydrated.
    Resumed {
        phase: Phase,
        remaining: TimeDelta,
    },
    /// Work finished while away; the break continues with `remaining` left.
    BreakStarted {
        work_minutes: i64,
        remaining: TimeDelta,
    },
    /// The whole cycle finished while away.
    CycleCompleted {
        work_minutes: Option<i64>,
        break_minutes: i64,
    },
    /// Something went wrong; the local timer was reset to idle.
    Failed(String),
}

pub struct TimerEngine<'a, S: TimerStore + ?Sized, C: Clock + ?Sized> {
    store: &'a S,
    clock: &'a C,
    user: UserId,
    session: Option<TimerSession>,
    warnings: Vec<String>,
}

impl<'a, S: TimerStore + ?Sized, C: Clock + ?Sized> TimerEngine<'a, S, C> {
    pub fn new(user: UserId, store: &'a S, clock: &'a C) -> Self {
        Self {
            store,
            clock,
            user,
            session: None,
            warnings: Vec::new(),
        }
    }

    /// Resolve the user through the gate; fails with `AuthRequired` before
    /// any storage is touched.
    pub fn activate<P: IdentityProvider>(
        gate: &IdentityGate<P>,
        store: &'a S,
        clock: &'a C,
    ) -> AppResult<Self> {
        let user = gate.require()?;
        Ok(Self::new(user, store, clock))
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    /// Time left in the current phase, if a timer is active.
    pub fn remaining(&self) -> Option<TimeDelta> {
        let now = self.clock.now();
        self.session.as_ref().map(|s| s.remaining(now))
    }

    /// Drain the non-fatal storage warnings gathered so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Catch up with the durable checkpoint. Never fails: errors are
    /// reported as [`Reconciliation::Failed`] and leave the engine idle.
    pub fn reconcile(&mut self) -> Reconciliation {
        match self.try_reconcile() {
            Ok(r) => r,
            Err(e) => {
                self.session = None;
                Reconciliation::Failed(e.to_string())
            }
        }
    }

    fn try_reconcile(&mut self) -> AppResult<Reconciliation> {
        for _ in 0..MAX_RECONCILE_ATTEMPTS {
            match self.reconcile_once() {
                Err(e) if e.is_conflict() => continue,
                other => return other,
            }
        }
        Err(AppError::VersionConflict {
            user: self.user.to_string(),
        })
    }

    fn reconcile_once(&mut self) -> AppResult<Reconciliation> {
        let Some(cp) = self.store.get(&self.user)? else {
            self.session = None;
            return Ok(Reconciliation::NoTimer);
        };

        let now = self.clock.now();
        let session = TimerSession::from_checkpoint(&cp, now);

        if !session.is_expired(now) {
            let outcome = Reconciliation::Resumed {
                phase: session.phase,
                remaining: session.remaining(now),
            };
            self.session = Some(session);
            return Ok(outcome);
        }

        match self.advance_expired(session, now, true)? {
            Transition::BreakStarted {
                work_minutes,
                remaining,
            } => Ok(Reconciliation::BreakStarted {
                work_minutes,
                remaining,
            }),
            Transition::CycleCompleted {
                work_minutes,
                break_minutes,
            } => Ok(Reconciliation::CycleCompleted {
                work_minutes,
                break_minutes,
            }),
            other => Err(AppError::InvalidTransition(format!(
                "unexpected reconciliation step: {other:?}"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// `Idle → Work/running`.
    pub fn start(&mut self, work_minutes: i64, break_minutes: i64) -> AppResult<Transition> {
        validate_minutes("work", work_minutes)?;
        validate_minutes("break", break_minutes)?;

        if self.session.is_some() {
            return Err(AppError::TimerAlreadyRunning);
        }

        let now = self.clock.now();
        let mut session = TimerSession::new(work_minutes, break_minutes, now);

        let written = self.store.put(&self.user, &session.draft(), now, None);
        session.version = self.guard(false, "saving the timer checkpoint", written)?;

        self.session = Some(session);
        Ok(Transition::Started {
            work_minutes,
            break_minutes,
        })
    }

    /// `running → paused`. The checkpoint records the pause instant, so a
    /// later activation comes back paused with the same elapsed time.
    pub fn pause(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();
        let mut session = self.session.take().ok_or(AppError::NoActiveTimer)?;

        let refused = if session.paused {
            Some("timer is already paused")
        } else if session.is_expired(now) {
            Some("the phase has already run out")
        } else {
            None
        };
        if let Some(reason) = refused {
            self.session = Some(session);
            return Err(AppError::InvalidTransition(reason.into()));
        }

        let durable_start = session.pause(now);
        let written = self
            .store
            .touch_start_time(&self.user, durable_start, session.version);
        if lost_race(&written) {
            return Ok(self.resync());
        }
        session.version = self.guard(false, "saving the pause", written)?;

        if let Some(version) = session.version {
            let marked = self.store.mark_paused(&self.user, now, Some(version));
            if lost_race(&marked) {
                return Ok(self.resync());
            }
            session.version = self.guard(false, "saving the pause", marked)?;
        }

        let outcome = Transition::Paused {
            phase: session.phase,
            remaining: session.remaining(now),
        };
        self.session = Some(session);
        Ok(outcome)
    }

    /// `paused → running`.
    pub fn resume(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();
        let mut session = self.session.take().ok_or(AppError::NoActiveTimer)?;

        if !session.paused {
            self.session = Some(session);
            return Err(AppError::InvalidTransition("timer is not paused".into()));
        }

        let durable_start = session.resume(now);
        let written = self
            .store
            .put(&self.user, &session.draft(), durable_start, session.version);
        if lost_race(&written) {
            return Ok(self.resync());
        }
        session.version = self.guard(false, "saving the resume", written)?;

        let outcome = Transition::Resumed {
            phase: session.phase,
            remaining: session.remaining(now),
        };
        self.session = Some(session);
        Ok(outcome)
    }

    /// `running|paused → Idle`, logging the elapsed part of the phase as an
    /// early stop.
    pub fn stop(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();
        let session = self.session.take().ok_or(AppError::NoActiveTimer)?;
        let minutes = stop_minutes(session.total_elapsed(now));

        if !self.claim_clear(&session, false)? {
            return Ok(self.resync());
        }

        match session.phase {
            Phase::Work => {
                let logged = self
                    .store
                    .insert_combined(&self.user, minutes, 0, SessionStatus::EarlyStop, now);
                self.guard(false, "logging the stopped session", logged)?;
            }
            Phase::Break => self.close_cycle(
                session.pending_session_id,
                session.work_duration,
                minutes,
                SessionStatus::EarlyStop,
                now,
                false,
            )?,
        }

        Ok(Transition::Stopped {
            phase: session.phase,
            minutes,
        })
    }

    /// `Work → Break`, logging the work done so far as its own session.
    pub fn skip_to_break(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();
        let session = self.session.take().ok_or(AppError::NoActiveTimer)?;

        if !session.phase.is_work() {
            self.session = Some(session);
            return Err(AppError::InvalidTransition(
                "skip is only possible during a work phase".into(),
            ));
        }

        let work_minutes = stop_minutes(session.total_elapsed(now));

        match self.begin_break(session, now, work_minutes, now, false)? {
            Transition::BreakStarted {
                work_minutes,
                remaining,
            } => Ok(Transition::SkippedToBreak {
                work_minutes,
                remaining,
            }),
            other => Ok(other),
        }
    }

    /// Advance the timer if the current phase has run out.
    pub fn tick(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();

        let Some(session) = self.session.take() else {
            return Ok(Transition::Idle);
        };

        if session.paused || !session.is_expired(now) {
            let outcome = Transition::Running {
                phase: session.phase,
                remaining: session.remaining(now),
                paused: session.paused,
            };
            self.session = Some(session);
            return Ok(outcome);
        }

        self.advance_expired(session, now, false)
    }

    // ------------------------------------------------------------------
    // Phase expiry, shared by tick and reconciliation
    // ------------------------------------------------------------------

    /// Handle a session whose phase has run out at `now`.
    ///
    /// In `strict` mode every storage error is returned and a version
    /// conflict means another client already advanced the timer. Otherwise
    /// errors become warnings and a conflict reloads the timer.
    fn advance_expired(
        &mut self,
        session: TimerSession,
        now: DateTime<Utc>,
        strict: bool,
    ) -> AppResult<Transition> {
        match session.phase {
            Phase::Work => {
                let work_minutes = session.work_duration;
                let boundary = session.phase_start(now) + TimeDelta::minutes(work_minutes);
                let break_end = boundary + TimeDelta::minutes(session.break_duration);

                if now < break_end {
                    return self.begin_break(session, boundary, work_minutes, now, strict);
                }

                if !self.claim_clear(&session, strict)? {
                    return Ok(self.resync());
                }

                let opened = self.store.open_work_session(&self.user, work_minutes, now);
                let id = self.guard(strict, "logging the work session", opened)?;
                self.close_cycle(
                    id,
                    work_minutes,
                    session.break_duration,
                    SessionStatus::Completed,
                    now,
                    strict,
                )?;

                self.session = None;
                Ok(Transition::CycleCompleted {
                    work_minutes: Some(work_minutes),
                    break_minutes: session.break_duration,
                })
            }
            Phase::Break => {
                if !self.claim_clear(&session, strict)? {
                    return Ok(self.resync());
                }

                self.close_cycle(
                    session.pending_session_id,
                    session.work_duration,
                    session.break_duration,
                    SessionStatus::Completed,
                    now,
                    strict,
                )?;

                self.session = None;
                Ok(Transition::CycleCompleted {
                    work_minutes: None,
                    break_minutes: session.break_duration,
                })
            }
        }
    }

    /// Move `session` into its break, backdated to `break_start`, and log
    /// `work_minutes` as a pending session row.
    ///
    /// The checkpoint is written first so that a concurrent client loses the
    /// race before anything reaches the session log.
    fn begin_break(
        &mut self,
        mut session: TimerSession,
        break_start: DateTime<Utc>,
        work_minutes: i64,
        now: DateTime<Utc>,
        strict: bool,
    ) -> AppResult<Transition> {
        let draft =
            CheckpointDraft::break_phase(session.break_duration, session.original_work_duration);
        let written = self
            .store
            .put(&self.user, &draft, break_start, session.version);
        if !strict && lost_race(&written) {
            return Ok(self.resync());
        }
        let saved = self.guard(strict, "saving the break checkpoint", written)?;

        session.enter_break(break_start, work_minutes);
        session.version = saved;

        let opened = self.store.open_work_session(&self.user, work_minutes, now);
        session.pending_session_id = self.guard(strict, "logging the work session", opened)?;

        // the row is only linked to a checkpoint that actually holds the break
        if let (Some(id), Some(_)) = (session.pending_session_id, saved) {
            let linked = self.store.attach_session(&self.user, id, session.version);
            session.version = self.guard(strict, "linking the work session", linked)?;
        }

        let remaining = session.remaining(now);
        self.session = Some(session);
        Ok(Transition::BreakStarted {
            work_minutes,
            remaining,
        })
    }

    /// Finish a cycle: close the pending row, or insert the whole cycle in
    /// one go when no row id is at hand or the linked row is gone.
    fn close_cycle(
        &mut self,
        session_id: Option<i64>,
        work_minutes: i64,
        break_minutes: i64,
        status: SessionStatus,
        now: DateTime<Utc>,
        strict: bool,
    ) -> AppResult<()> {
        let closed = session_id.map(|id| {
            self.store
                .close_session(&self.user, id, break_minutes, status)
        });
        let logged = match closed {
            Some(Err(AppError::SessionNotFound(_))) | None => self
                .store
                .insert_combined(&self.user, work_minutes, break_minutes, status, now)
                .map(|_| ()),
            Some(other) => other,
        };
        self.guard(strict, "closing the session", logged)?;
        Ok(())
    }

    /// Delete the checkpoint this session was read as. `Ok(false)` means
    /// another client changed or removed it first; strict mode reports that
    /// as a conflict. Storage errors are swallowed: a stray row is picked up
    /// again by the next reconciliation.
    fn claim_clear(&mut self, session: &TimerSession, strict: bool) -> AppResult<bool> {
        match self.store.clear(&self.user, session.version) {
            Ok(false) if session.version.is_some() && strict => Err(AppError::VersionConflict {
                user: self.user.to_string(),
            }),
            Ok(false) if session.version.is_some() => Ok(false),
            _ => Ok(true),
        }
    }

    /// Drop the local session after losing a race and take over whatever
    /// the store holds now.
    fn resync(&mut self) -> Transition {
        self.session = None;
        self.warnings
            .push("timer was changed by another client; reloaded it".into());

        match self.reconcile() {
            Reconciliation::NoTimer => Transition::Idle,
            Reconciliation::Resumed { phase, remaining } => Transition::Running {
                phase,
                remaining,
                paused: self.session.as_ref().is_some_and(|s| s.paused),
            },
            Reconciliation::BreakStarted {
                work_minutes,
                remaining,
            } => Transition::BreakStarted {
                work_minutes,
                remaining,
            },
            Reconciliation::CycleCompleted {
                work_minutes,
                break_minutes,
            } => Transition::CycleCompleted {
                work_minutes,
                break_minutes,
            },
            Reconciliation::Failed(msg) => {
                self.warnings.push(format!("reloading the timer failed: {msg}"));
                Transition::Idle
            }
        }
    }

    fn guard<T>(&mut self, strict: bool, context: &str, result: AppResult<T>) -> AppResult<Option<T>> {
        match result {
            Ok(v) => Ok(Some(v)),
            Err(e) if strict => Err(e),
            Err(e) => {
                self.warnings.push(format!("{context} failed: {e}"));
                Ok(None)
            }
        }
    }
}

/// Delete the user's checkpoint if an identity is available. Silent in every
/// failure case; returns whether a user was resolved.
pub fn discard_checkpoint<P, S>(gate: &IdentityGate<P>, store: &S) -> bool
where
    P: IdentityProvider,
    S: CheckpointStore + ?Sized,
{
    match gate.resolve_optional() {
        Some(user) => {
            let _ = store.clear(&user, None);
            true
        }
        None => false,
    }
}

fn lost_race<T>(result: &AppResult<T>) -> bool {
    matches!(result, Err(e) if e.is_conflict())
}

fn validate_minutes(label: &str, minutes: i64) -> AppResult<()> {
    if !(1..=MAX_PHASE_MINUTES).contains(&minutes) {
        return Err(AppError::InvalidDuration(format!(
            "{label} duration must be between 1 and {MAX_PHASE_MINUTES} minutes (got {minutes})"
        )));
    }
    Ok(())
}
