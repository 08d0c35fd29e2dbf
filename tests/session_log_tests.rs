use chrono::TimeDelta;
use pomodash::db::pool::DbPool;
use pomodash::db::sessions::{SessionFilter, SessionLog, get_session, load_sessions};
use pomodash::errors::AppError;
use pomodash::models::SessionStatus;

mod common;
use common::{all_sessions, t0, user};

#[test]
fn test_open_then_close_with_break() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");

    let id = pool.open_work_session(&ada, 25, t0()).expect("open");
    let row = get_session(&pool.conn, id).unwrap();
    assert_eq!(row.work_minutes, 25);
    assert_eq!(row.break_minutes, 0);
    assert_eq!(row.status, SessionStatus::WorkCompletePendingBreak);
    assert!(!row.status.is_final());

    pool.close_with_break(&ada, id, 5).expect("close");
    let row = get_session(&pool.conn, id).unwrap();
    assert_eq!(row.break_minutes, 5);
    assert_eq!(row.status, SessionStatus::Completed);
    assert_eq!(row.timestamp, t0());
}

#[test]
fn test_close_early_stop_sets_status() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");

    let id = pool.open_work_session(&ada, 25, t0()).unwrap();
    pool.close_early_stop(&ada, id, 2).unwrap();

    let row = get_session(&pool.conn, id).unwrap();
    assert_eq!(row.status, SessionStatus::EarlyStop);
    assert_eq!(row.break_minutes, 2);
}

#[test]
fn test_close_unknown_or_foreign_row_fails() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");
    let bob = user("bob");

    let err = pool.close_with_break(&ada, 999, 5).unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound(999)));

    let id = pool.open_work_session(&ada, 25, t0()).unwrap();
    let err = pool.close_with_break(&bob, id, 5).unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound(_)));
}

#[test]
fn test_negative_minutes_rejected() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");

    let err = pool
        .insert_combined(&ada, -1, 0, SessionStatus::EarlyStop, t0())
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidDuration(_)));
    assert!(all_sessions(&pool, &ada).is_empty());
}

#[test]
fn test_load_sessions_orders_and_limits() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");
    let bob = user("bob");

    for i in 0..5 {
        pool.insert_combined(
            &ada,
            10 + i,
            5,
            SessionStatus::Completed,
            t0() + TimeDelta::hours(i),
        )
        .unwrap();
    }
    pool.insert_combined(&bob, 25, 5, SessionStatus::Completed, t0())
        .unwrap();

    let all = all_sessions(&pool, &ada);
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].work_minutes, 10);
    assert_eq!(all[4].work_minutes, 14);

    let last_two = load_sessions(
        &pool.conn,
        &ada,
        &SessionFilter {
            limit: Some(2),
            ..SessionFilter::default()
        },
    )
    .unwrap();
    let works: Vec<i64> = last_two.iter().map(|s| s.work_minutes).collect();
    assert_eq!(works, vec![13, 14]);

    let window = load_sessions(
        &pool.conn,
        &ada,
        &SessionFilter {
            since: Some(t0() + TimeDelta::hours(1)),
            until: Some(t0() + TimeDelta::hours(3)),
            limit: None,
        },
    )
    .unwrap();
    let works: Vec<i64> = window.iter().map(|s| s.work_minutes).collect();
    assert_eq!(works, vec![11, 12]);
}

#[test]
fn test_efficiency_of_rows() {
    let pool = DbPool::in_memory().expect("db");
    let ada = user("ada");

    let id = pool
        .insert_combined(&ada, 20, 5, SessionStatus::Completed, t0())
        .unwrap();
    let empty = pool
        .insert_combined(&ada, 0, 0, SessionStatus::EarlyStop, t0())
        .unwrap();

    let row = get_session(&pool.conn, id).unwrap();
    assert_eq!(row.total_minutes(), 25);
    assert_eq!(row.efficiency(), Some(80.0));
    assert_eq!(get_session(&pool.conn, empty).unwrap().efficiency(), None);
}
