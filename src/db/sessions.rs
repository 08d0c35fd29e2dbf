//! Session log writer and readers for the append-only `sessions` table.

use crate::core::identity::UserId;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::{SessionRecord, SessionStatus};
use crate::utils::time::{format_utc, parse_utc};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, ToSql, params};

pub trait SessionLog {
    /// Insert `{work_minutes, break_minutes: 0, status: "Work Completed"}`
    /// and return its id.
    fn open_work_session(
        &self,
        user: &UserId,
        work_minutes: i64,
        at: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Set the break minutes and final status of a row opened earlier.
    fn close_session(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
        status: SessionStatus,
    ) -> AppResult<()>;

    /// Single-shot insert for when no opened row is at hand.
    fn insert_combined(
        &self,
        user: &UserId,
        work_minutes: i64,
        break_minutes: i64,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<i64>;

    fn close_with_break(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
    ) -> AppResult<()> {
        self.close_session(user, session_id, break_minutes, SessionStatus::Completed)
    }

    fn close_early_stop(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
    ) -> AppResult<()> {
        self.close_session(user, session_id, break_minutes, SessionStatus::EarlyStop)
    }
}

impl SessionLog for DbPool {
    fn open_work_session(
        &self,
        user: &UserId,
        work_minutes: i64,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.insert_combined(
            user,
            work_minutes,
            0,
            SessionStatus::WorkCompletePendingBreak,
            at,
        )
    }

    fn close_session(
        &self,
        user: &UserId,
        session_id: i64,
        break_minutes: i64,
        status: SessionStatus,
    ) -> AppResult<()> {
        check_minutes("break", break_minutes)?;

        let changed = self.conn.execute(
            "UPDATE sessions SET break_minutes = ?1, status = ?2
             WHERE id = ?3 AND user_id = ?4",
            params![break_minutes, status.to_db_str(), session_id, user.as_str()],
        )?;

        if changed == 0 {
            return Err(AppError::SessionNotFound(session_id));
        }
        Ok(())
    }

    fn insert_combined(
        &self,
        user: &UserId,
        work_minutes: i64,
        break_minutes: i64,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> AppResult<i64> {
        check_minutes("work", work_minutes)?;
        check_minutes("break", break_minutes)?;

        self.conn.execute(
            "INSERT INTO sessions (user_id, work_minutes, break_minutes, status, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.as_str(),
                work_minutes,
                break_minutes,
                status.to_db_str(),
                format_utc(at),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }
}

fn check_minutes(label: &str, minutes: i64) -> AppResult<()> {
    if minutes < 0 {
        return Err(AppError::InvalidDuration(format!(
            "{label} minutes cannot be negative ({minutes})"
        )));
    }
    Ok(())
}

/// Which part of a user's log to read.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `timestamp`.
    pub until: Option<DateTime<Utc>>,
    /// Keep only the newest N rows.
    pub limit: Option<usize>,
}

/// Load a user's sessions, oldest first.
pub fn load_sessions(
    conn: &Connection,
    user: &UserId,
    filter: &SessionFilter,
) -> AppResult<Vec<SessionRecord>> {
    let mut sql = String::from(
        "SELECT id, user_id, work_minutes, break_minutes, status, timestamp
         FROM sessions
         WHERE user_id = ?",
    );

    let since = filter.since.map(format_utc);
    let until = filter.until.map(format_utc);
    let limit = filter.limit.map(|n| n as i64);

    let user_str = user.as_str();
    let mut args: Vec<&dyn ToSql> = vec![&user_str];
    if let Some(s) = &since {
        sql.push_str(" AND timestamp >= ?");
        args.push(s);
    }
    if let Some(u) = &until {
        sql.push_str(" AND timestamp < ?");
        args.push(u);
    }
    sql.push_str(" ORDER BY timestamp DESC, id DESC");
    if let Some(n) = &limit {
        sql.push_str(" LIMIT ?");
        args.push(n);
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args.as_slice(), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    out.reverse();
    Ok(out)
}

pub fn get_session(conn: &Connection, id: i64) -> AppResult<SessionRecord> {
    conn.query_row(
        "SELECT id, user_id, work_minutes, break_minutes, status, timestamp
         FROM sessions WHERE id = ?1",
        [id],
        map_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::SessionNotFound(id),
        other => AppError::from(other),
    })
}

pub fn count_sessions(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
    Ok(n)
}

pub fn map_row(row: &Row) -> rusqlite::Result<SessionRecord> {
    let status_str: String = row.get("status")?;
    let status = SessionStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidStatus(status_str.clone())),
        )
    })?;

    let ts_str: String = row.get("timestamp")?;
    let timestamp = parse_utc(&ts_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidTimestamp(ts_str.clone())),
        )
    })?;

    Ok(SessionRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        work_minutes: row.get("work_minutes")?,
        break_minutes: row.get("break_minutes")?,
        status,
        timestamp,
    })
}
