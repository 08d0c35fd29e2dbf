use chrono::{DateTime, TimeDelta, Utc};
use pomodash::core::clock::ManualClock;
use pomodash::core::engine::{
    Reconciliation, TimerEngine, Transition, discard_checkpoint,
};
use pomodash::core::identity::{IdentityGate, StaticIdentity, UserId};
use pomodash::db::checkpoint::CheckpointStore;
use pomodash::db::pool::DbPool;
use pomodash::db::sessions::SessionLog;
use pomodash::errors::{AppError, AppResult};
use pomodash::models::{CheckpointDraft, Phase, SessionStatus, TimerCheckpoint};
use std::cell::Cell;

mod common;
use common::{all_sessions, t0, user};

fn engine<'a>(pool: &'a DbPool, clock: &'a ManualClock) -> TimerEngine<'a, DbPool, ManualClock> {
    TimerEngine::new(user("ada"), pool, clock)
}

// ---------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------

#[test]
fn test_reconcile_without_checkpoint_is_noop() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    assert_eq!(e.reconcile(), Reconciliation::NoTimer);
    assert_eq!(e.reconcile(), Reconciliation::NoTimer);
    assert!(e.is_idle());
    assert!(pool.get(&user("ada")).unwrap().is_none());
    assert!(all_sessions(&pool, &user("ada")).is_empty());
}

#[test]
fn test_reconcile_rehydrates_phase_in_progress() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());

    engine(&pool, &clock).start(25, 5).unwrap();
    clock.advance_mins(10);

    let mut fresh = engine(&pool, &clock);
    assert_eq!(
        fresh.reconcile(),
        Reconciliation::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(15),
        }
    );
    assert!(!fresh.is_idle());
    assert!(all_sessions(&pool, &user("ada")).is_empty());
}

#[test]
fn test_reconcile_both_phases_elapsed_logs_single_completed_row() {
    let pool = DbPool::in_memory().unwrap();
    let ada = user("ada");
    pool.put(&ada, &CheckpointDraft::work(25, 5), t0(), None)
        .unwrap();

    let clock = ManualClock::new(t0() + TimeDelta::minutes(35));
    let mut e = engine(&pool, &clock);

    assert_eq!(
        e.reconcile(),
        Reconciliation::CycleCompleted {
            work_minutes: Some(25),
            break_minutes: 5,
        }
    );
    assert!(e.is_idle());
    assert!(pool.get(&ada).unwrap().is_none());

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].work_minutes, 25);
    assert_eq!(rows[0].break_minutes, 5);
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_reconcile_work_elapsed_starts_backdated_break() {
    let pool = DbPool::in_memory().unwrap();
    let ada = user("ada");
    pool.put(&ada, &CheckpointDraft::work(25, 5), t0(), None)
        .unwrap();

    let clock = ManualClock::new(t0() + TimeDelta::minutes(27));
    let mut e = engine(&pool, &clock);

    assert_eq!(
        e.reconcile(),
        Reconciliation::BreakStarted {
            work_minutes: 25,
            remaining: TimeDelta::minutes(3),
        }
    );

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].work_minutes, 25);
    assert_eq!(rows[0].break_minutes, 0);
    assert_eq!(rows[0].status, SessionStatus::WorkCompletePendingBreak);

    let cp = pool.get(&ada).unwrap().expect("break checkpoint");
    assert_eq!(cp.phase, Phase::Break);
    assert_eq!(cp.duration_minutes, 5);
    assert_eq!(cp.original_work_duration, 25);
    assert_eq!(cp.start_time, t0() + TimeDelta::minutes(25));
    assert_eq!(cp.pending_session_id, Some(rows[0].id));

    // the break then runs out while the client is watching
    clock.advance_mins(3);
    assert_eq!(
        e.tick().unwrap(),
        Transition::CycleCompleted {
            work_minutes: None,
            break_minutes: 5,
        }
    );

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].break_minutes, 5);
    assert_eq!(rows[0].status, SessionStatus::Completed);
    assert!(pool.get(&ada).unwrap().is_none());
}

#[test]
fn test_reconcile_expired_break_closes_pending_row() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let ada = user("ada");

    let mut e = engine(&pool, &clock);
    e.start(25, 5).unwrap();
    clock.advance_mins(25);
    assert!(matches!(e.tick().unwrap(), Transition::BreakStarted { .. }));

    // the client goes away for the whole break
    clock.advance_mins(30);
    let mut later = engine(&pool, &clock);
    assert_eq!(
        later.reconcile(),
        Reconciliation::CycleCompleted {
            work_minutes: None,
            break_minutes: 5,
        }
    );

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (25, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_reconcile_expired_break_without_pending_id_inserts_whole_cycle() {
    let pool = DbPool::in_memory().unwrap();
    let ada = user("ada");
    pool.put(&ada, &CheckpointDraft::break_phase(5, 25), t0(), None)
        .unwrap();

    let clock = ManualClock::new(t0() + TimeDelta::minutes(6));
    let mut e = engine(&pool, &clock);

    assert!(matches!(
        e.reconcile(),
        Reconciliation::CycleCompleted { .. }
    ));

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (25, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
    assert!(pool.get(&ada).unwrap().is_none());
}

#[test]
fn test_reconcile_expired_break_with_missing_row_inserts_whole_cycle() {
    let pool = DbPool::in_memory().unwrap();
    let ada = user("ada");
    let v = pool
        .put(&ada, &CheckpointDraft::break_phase(5, 25), t0(), None)
        .unwrap();
    pool.attach_session(&ada, 999, Some(v)).unwrap();

    let clock = ManualClock::new(t0() + TimeDelta::minutes(6));
    let mut e = engine(&pool, &clock);

    assert!(matches!(
        e.reconcile(),
        Reconciliation::CycleCompleted { .. }
    ));

    let rows = all_sessions(&pool, &ada);
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (25, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_reconcile_future_start_time_counts_as_zero_elapsed() {
    let pool = DbPool::in_memory().unwrap();
    let ada = user("ada");
    pool.put(
        &ada,
        &CheckpointDraft::work(25, 5),
        t0() + TimeDelta::minutes(10),
        None,
    )
    .unwrap();

    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    assert_eq!(
        e.reconcile(),
        Reconciliation::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(25),
        }
    );
}

// ---------------------------------------------------------------------
// User actions
// ---------------------------------------------------------------------

#[test]
fn test_start_writes_work_checkpoint_and_no_session() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    assert_eq!(
        e.start(25, 5).unwrap(),
        Transition::Started {
            work_minutes: 25,
            break_minutes: 5,
        }
    );

    let cp = pool.get(&user("ada")).unwrap().expect("checkpoint");
    assert_eq!(cp.phase, Phase::Work);
    assert_eq!(cp.duration_minutes, 25);
    assert_eq!(cp.break_duration, 5);
    assert_eq!(cp.original_work_duration, 25);
    assert_eq!(cp.start_time, t0());
    assert!(all_sessions(&pool, &user("ada")).is_empty());
}

#[test]
fn test_start_validates_input_and_state() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    assert!(matches!(e.start(0, 5), Err(AppError::InvalidDuration(_))));
    assert!(matches!(e.start(25, 0), Err(AppError::InvalidDuration(_))));
    assert!(matches!(e.start(2000, 5), Err(AppError::InvalidDuration(_))));

    e.start(25, 5).unwrap();
    assert!(matches!(e.start(25, 5), Err(AppError::TimerAlreadyRunning)));
}

#[test]
fn test_actions_on_idle_timer_fail() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    assert!(matches!(e.pause(), Err(AppError::NoActiveTimer)));
    assert!(matches!(e.resume(), Err(AppError::NoActiveTimer)));
    assert!(matches!(e.stop(), Err(AppError::NoActiveTimer)));
    assert!(matches!(e.skip_to_break(), Err(AppError::NoActiveTimer)));
    assert_eq!(e.tick().unwrap(), Transition::Idle);
}

#[test]
fn test_pause_duration_does_not_change_remaining() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(25, 5).unwrap();
    clock.advance_mins(5);
    assert_eq!(
        e.pause().unwrap(),
        Transition::Paused {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(20),
        }
    );
    assert!(matches!(e.pause(), Err(AppError::InvalidTransition(_))));

    clock.advance_mins(90);
    assert_eq!(
        e.tick().unwrap(),
        Transition::Running {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(20),
            paused: true,
        }
    );

    assert_eq!(
        e.resume().unwrap(),
        Transition::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(20),
        }
    );
    assert!(matches!(e.resume(), Err(AppError::InvalidTransition(_))));

    clock.advance_mins(1);
    assert_eq!(e.remaining(), Some(TimeDelta::minutes(19)));

    // a reload right now sees the same remaining time
    let mut reloaded = engine(&pool, &clock);
    assert_eq!(
        reloaded.reconcile(),
        Reconciliation::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(19),
        }
    );
}

#[test]
fn test_pause_survives_reload() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());

    let mut watcher = engine(&pool, &clock);
    watcher.start(25, 5).unwrap();
    clock.advance_mins(5);
    watcher.pause().unwrap();
    drop(watcher);

    clock.advance_mins(10);
    let mut e = engine(&pool, &clock);
    assert_eq!(
        e.reconcile(),
        Reconciliation::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(20),
        }
    );
    assert!(e.session().is_some_and(|s| s.paused));

    // still frozen, and resuming counts from now
    clock.advance_mins(60);
    assert_eq!(e.remaining(), Some(TimeDelta::minutes(20)));
    e.resume().unwrap();
    clock.advance_mins(2);

    let mut reloaded = engine(&pool, &clock);
    assert_eq!(
        reloaded.reconcile(),
        Reconciliation::Resumed {
            phase: Phase::Work,
            remaining: TimeDelta::minutes(18),
        }
    );
    assert!(reloaded.session().is_some_and(|s| !s.paused));
    assert!(all_sessions(&pool, &user("ada")).is_empty());
}

#[test]
fn test_pause_refused_once_phase_ran_out() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(1, 1).unwrap();
    clock.advance_secs(61);
    assert!(matches!(e.pause(), Err(AppError::InvalidTransition(_))));
    assert!(matches!(e.tick().unwrap(), Transition::BreakStarted { .. }));
}

#[test]
fn test_stop_right_after_start_logs_one_minute() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(25, 5).unwrap();
    clock.advance(TimeDelta::milliseconds(100));

    assert_eq!(
        e.stop().unwrap(),
        Transition::Stopped {
            phase: Phase::Work,
            minutes: 1,
        }
    );
    assert!(e.is_idle());
    assert!(pool.get(&user("ada")).unwrap().is_none());

    let rows = all_sessions(&pool, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (1, 0));
    assert_eq!(rows[0].status, SessionStatus::EarlyStop);
}

#[test]
fn test_stop_during_break_closes_pending_row_as_early_stop() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(25, 5).unwrap();
    clock.advance_mins(25);
    e.tick().unwrap();
    clock.advance_mins(2);

    assert_eq!(
        e.stop().unwrap(),
        Transition::Stopped {
            phase: Phase::Break,
            minutes: 2,
        }
    );

    let rows = all_sessions(&pool, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (25, 2));
    assert_eq!(rows[0].status, SessionStatus::EarlyStop);
}

#[test]
fn test_skip_then_natural_break_gives_one_completed_row() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(25, 5).unwrap();
    clock.advance_mins(10);
    assert_eq!(
        e.skip_to_break().unwrap(),
        Transition::SkippedToBreak {
            work_minutes: 10,
            remaining: TimeDelta::minutes(5),
        }
    );
    assert!(matches!(
        e.skip_to_break(),
        Err(AppError::InvalidTransition(_))
    ));

    let cp = pool.get(&user("ada")).unwrap().unwrap();
    assert_eq!(cp.phase, Phase::Break);
    assert_eq!(cp.start_time, t0() + TimeDelta::minutes(10));

    clock.advance_mins(5);
    assert!(matches!(
        e.tick().unwrap(),
        Transition::CycleCompleted { .. }
    ));

    let rows = all_sessions(&pool, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (10, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_tick_work_expiry_starts_break_at_boundary() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let mut e = engine(&pool, &clock);

    e.start(1, 1).unwrap();
    clock.advance_secs(30);
    assert_eq!(
        e.tick().unwrap(),
        Transition::Running {
            phase: Phase::Work,
            remaining: TimeDelta::seconds(30),
            paused: false,
        }
    );

    clock.advance_secs(31);
    assert_eq!(
        e.tick().unwrap(),
        Transition::BreakStarted {
            work_minutes: 1,
            remaining: TimeDelta::seconds(59),
        }
    );
}

// ---------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------

#[test]
fn test_activation_requires_identity() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());
    let gate = IdentityGate::new(StaticIdentity::new(Some("   ")));

    assert!(matches!(
        TimerEngine::activate(&gate, &pool, &clock),
        Err(AppError::AuthRequired)
    ));

    let gate = IdentityGate::new(StaticIdentity::new(Some("ada")));
    let e = TimerEngine::activate(&gate, &pool, &clock).expect("activated");
    assert_eq!(e.user().as_str(), "ada");
}

#[test]
fn test_discard_checkpoint_is_silent_without_identity() {
    let pool = DbPool::in_memory().unwrap();
    pool.put(&user("ada"), &CheckpointDraft::work(25, 5), t0(), None)
        .unwrap();

    let nobody = IdentityGate::new(StaticIdentity::new(None));
    assert!(!discard_checkpoint(&nobody, &pool));
    assert!(pool.get(&user("ada")).unwrap().is_some());

    let ada = IdentityGate::new(StaticIdentity::new(Some("ada")));
    assert!(discard_checkpoint(&ada, &pool));
    assert!(pool.get(&user("ada")).unwrap().is_none());
}

// ---------------------------------------------------------------------
// Storage failures and concurrent clients
// ---------------------------------------------------------------------

/// Store that can be switched into failing every write, every read, or
/// only the opening of session rows.
struct FlakyStore {
    inner: DbPool,
    fail_writes: Cell<bool>,
    fail_reads: Cell<bool>,
    fail_open: Cell<bool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: DbPool::in_memory().unwrap(),
            fail_writes: Cell::new(false),
            fail_reads: Cell::new(false),
            fail_open: Cell::new(false),
        }
    }

    fn write(&self) -> AppResult<()> {
        if self.fail_writes.get() {
            Err(AppError::Other("store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl CheckpointStore for FlakyStore {
    fn put(
        &self,
        user: &UserId,
        draft: &CheckpointDraft,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.write()?;
        self.inner.put(user, draft, start_time, expected_version)
    }

    fn get(&self, user: &UserId) -> AppResult<Option<TimerCheckpoint>> {
        if self.fail_reads.get() {
            return Err(AppError::Other("store offline".into()));
        }
        self.inner.get(user)
    }

    fn touch_start_time(
        &self,
        user: &UserId,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.write()?;
        self.inner.touch_start_time(user, start_time, expected_version)
    }

    fn mark_paused(
        &self,
        user: &UserId,
        paused_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.write()?;
        self.inner.mark_paused(user, paused_at, expected_version)
    }

    fn attach_session(
        &self,
        user: &UserId,
        session_id: i64,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.write()?;
        self.inner.attach_session(user, session_id, expected_version)
    }

    fn clear(&self, user: &UserId, expected_version: Option<i64>) -> AppResult<bool> {
        self.write()?;
        self.inner.clear(user, expected_version)
    }
}

impl SessionLog for FlakyStore {
    fn open_work_session(
        &self,
        user: &UserId,
        work_minutes: i64,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.write()?;
        if self.fail_open.get() {
            return Err(AppError::Other("session log locked".into()));
        }
        self.inner.open_work_session(user, work_minutes, at)
    }

    fn close_session(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
        status: SessionStatus,
    ) -> AppResult<()> {
        self.write()?;
        self.inner
            .close_session(user, session_id, break_minutes, status)
    }

    fn insert_combined(
        &self,
        user: &UserId,
        work_minutes: i64,
        break_minutes: i64,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.write()?;
        self.inner
            .insert_combined(user, work_minutes, break_minutes, status, at)
    }
}

#[test]
fn test_write_failures_become_warnings_and_state_advances() {
    let store = FlakyStore::new();
    let clock = ManualClock::new(t0());
    let mut e = TimerEngine::new(user("ada"), &store, &clock);

    store.fail_writes.set(true);

    assert!(matches!(e.start(25, 5).unwrap(), Transition::Started { .. }));
    assert!(!e.is_idle());
    let warnings = e.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("store offline"));
    assert!(e.take_warnings().is_empty());

    clock.advance_mins(25);
    assert!(matches!(
        e.tick().unwrap(),
        Transition::BreakStarted { .. }
    ));
    assert_eq!(e.session().map(|s| s.phase), Some(Phase::Break));
    assert!(!e.take_warnings().is_empty());

    assert!(matches!(e.stop().unwrap(), Transition::Stopped { .. }));
    assert!(e.is_idle());

    store.fail_writes.set(false);
    assert!(all_sessions(&store.inner, &user("ada")).is_empty());
    assert!(store.inner.get(&user("ada")).unwrap().is_none());
}

#[test]
fn test_reconcile_failure_resets_to_idle() {
    let store = FlakyStore::new();
    let clock = ManualClock::new(t0());
    let mut e = TimerEngine::new(user("ada"), &store, &clock);
    e.start(25, 5).unwrap();

    store.fail_reads.set(true);
    assert!(matches!(e.reconcile(), Reconciliation::Failed(_)));
    assert!(e.is_idle());

    // the checkpoint survives and is picked up by the next activation
    store.fail_reads.set(false);
    assert!(matches!(e.reconcile(), Reconciliation::Resumed { .. }));
}

#[test]
fn test_skip_with_failed_row_logs_skipped_minutes() {
    let store = FlakyStore::new();
    let clock = ManualClock::new(t0());
    let mut e = TimerEngine::new(user("ada"), &store, &clock);

    e.start(25, 5).unwrap();
    clock.advance_mins(10);

    store.fail_open.set(true);
    assert!(matches!(
        e.skip_to_break().unwrap(),
        Transition::SkippedToBreak { work_minutes: 10, .. }
    ));
    assert!(e.take_warnings()[0].contains("session log locked"));
    store.fail_open.set(false);

    clock.advance_mins(5);
    assert_eq!(
        e.tick().unwrap(),
        Transition::CycleCompleted {
            work_minutes: None,
            break_minutes: 5,
        }
    );

    let rows = all_sessions(&store.inner, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (10, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_reconcile_write_failure_logs_nothing() {
    let store = FlakyStore::new();
    store
        .inner
        .put(&user("ada"), &CheckpointDraft::work(25, 5), t0(), None)
        .unwrap();

    let clock = ManualClock::new(t0() + TimeDelta::minutes(27));
    let mut e = TimerEngine::new(user("ada"), &store, &clock);

    store.fail_writes.set(true);
    assert!(matches!(e.reconcile(), Reconciliation::Failed(_)));
    assert!(e.is_idle());

    store.fail_writes.set(false);
    assert!(all_sessions(&store.inner, &user("ada")).is_empty());
    assert!(matches!(
        e.reconcile(),
        Reconciliation::BreakStarted { work_minutes: 25, .. }
    ));
}

/// Store where another client touches or removes the checkpoint right
/// after the first read.
struct RacingStore {
    inner: DbPool,
    race: Cell<Option<Race>>,
}

#[derive(Clone, Copy)]
enum Race {
    Touch,
    Finish,
}

impl CheckpointStore for RacingStore {
    fn put(
        &self,
        user: &UserId,
        draft: &CheckpointDraft,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.inner.put(user, draft, start_time, expected_version)
    }

    fn get(&self, user: &UserId) -> AppResult<Option<TimerCheckpoint>> {
        let cp = self.inner.get(user)?;
        if let (Some(row), Some(race)) = (&cp, self.race.take()) {
            match race {
                Race::Touch => {
                    self.inner.touch_start_time(user, row.start_time, None)?;
                }
                Race::Finish => {
                    self.inner.clear(user, None)?;
                    self.inner.insert_combined(
                        user,
                        row.duration_minutes,
                        row.break_duration,
                        SessionStatus::Completed,
                        row.start_time,
                    )?;
                }
            }
        }
        Ok(cp)
    }

    fn touch_start_time(
        &self,
        user: &UserId,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.inner.touch_start_time(user, start_time, expected_version)
    }

    fn mark_paused(
        &self,
        user: &UserId,
        paused_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.inner.mark_paused(user, paused_at, expected_version)
    }

    fn attach_session(
        &self,
        user: &UserId,
        session_id: i64,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        self.inner.attach_session(user, session_id, expected_version)
    }

    fn clear(&self, user: &UserId, expected_version: Option<i64>) -> AppResult<bool> {
        self.inner.clear(user, expected_version)
    }
}

impl SessionLog for RacingStore {
    fn open_work_session(
        &self,
        user: &UserId,
        work_minutes: i64,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.inner.open_work_session(user, work_minutes, at)
    }

    fn close_session(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
        status: SessionStatus,
    ) -> AppResult<()> {
        self.inner
            .close_session(user, session_id, break_minutes, status)
    }

    fn insert_combined(
        &self,
        user: &UserId,
        work_minutes: i64,
        break_minutes: i64,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.inner
            .insert_combined(user, work_minutes, break_minutes, status, at)
    }
}

fn racing(race: Race) -> RacingStore {
    let inner = DbPool::in_memory().unwrap();
    inner
        .put(&user("ada"), &CheckpointDraft::work(25, 5), t0(), None)
        .unwrap();
    RacingStore {
        inner,
        race: Cell::new(Some(race)),
    }
}

#[test]
fn test_reconcile_retries_after_version_conflict() {
    let store = racing(Race::Touch);
    let clock = ManualClock::new(t0() + TimeDelta::minutes(27));
    let mut e = TimerEngine::new(user("ada"), &store, &clock);

    assert!(matches!(
        e.reconcile(),
        Reconciliation::BreakStarted { work_minutes: 25, .. }
    ));

    let rows = all_sessions(&store.inner, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, SessionStatus::WorkCompletePendingBreak);
}

#[test]
fn test_reconcile_loses_race_without_double_logging() {
    let store = racing(Race::Finish);
    let clock = ManualClock::new(t0() + TimeDelta::minutes(35));
    let mut e = TimerEngine::new(user("ada"), &store, &clock);

    // the other client completed the cycle first
    assert_eq!(e.reconcile(), Reconciliation::NoTimer);
    assert!(e.is_idle());

    let rows = all_sessions(&store.inner, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (25, 5));
}

#[test]
fn test_tick_after_other_client_stopped_logs_nothing() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());

    let mut watcher = engine(&pool, &clock);
    watcher.start(25, 5).unwrap();

    clock.advance_mins(10);
    let mut other = engine(&pool, &clock);
    assert!(matches!(other.reconcile(), Reconciliation::Resumed { .. }));
    other.stop().unwrap();

    clock.advance_mins(20);
    assert_eq!(watcher.tick().unwrap(), Transition::Idle);
    assert!(watcher.is_idle());
    assert!(!watcher.take_warnings().is_empty());

    let rows = all_sessions(&pool, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (10, 0));
    assert_eq!(rows[0].status, SessionStatus::EarlyStop);
}

#[test]
fn test_tick_after_other_client_skipped_follows_its_break() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());

    let mut watcher = engine(&pool, &clock);
    watcher.start(25, 5).unwrap();

    clock.advance_mins(10);
    let mut other = engine(&pool, &clock);
    other.reconcile();
    other.skip_to_break().unwrap();

    // the other client's break ended at t0+15m
    clock.advance_mins(16);
    assert_eq!(
        watcher.tick().unwrap(),
        Transition::CycleCompleted {
            work_minutes: None,
            break_minutes: 5,
        }
    );
    assert!(watcher.is_idle());
    assert!(pool.get(&user("ada")).unwrap().is_none());

    let rows = all_sessions(&pool, &user("ada"));
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].work_minutes, rows[0].break_minutes), (10, 5));
    assert_eq!(rows[0].status, SessionStatus::Completed);
}

#[test]
fn test_stale_stop_does_not_log_twice() {
    let pool = DbPool::in_memory().unwrap();
    let clock = ManualClock::new(t0());

    let mut watcher = engine(&pool, &clock);
    watcher.start(25, 5).unwrap();

    clock.advance_mins(3);
    let mut other = engine(&pool, &clock);
    other.reconcile();
    other.stop().unwrap();

    clock.advance_mins(1);
    assert_eq!(watcher.stop().unwrap(), Transition::Idle);
    assert_eq!(all_sessions(&pool, &user("ada")).len(), 1);
}
