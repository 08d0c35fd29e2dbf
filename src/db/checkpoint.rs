//! Store adapter for the single `active_timer` row of each user.
//!
//! Every write bumps `version`. Writers that pass the version they last read
//! get `AppError::VersionConflict` when another client got there first.

use crate::core::identity::UserId;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::checkpoint::RUNNING_STATUS;
use crate::models::{CheckpointDraft, Phase, TimerCheckpoint};
use crate::utils::time::{format_utc, parse_utc};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub trait CheckpointStore {
    /// Write the whole row with the given start time, as a running phase.
    /// `None` upserts unconditionally; `Some(v)` only replaces the row if it
    /// is at `v`.
    fn put(
        &self,
        user: &UserId,
        draft: &CheckpointDraft,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64>;

    fn get(&self, user: &UserId) -> AppResult<Option<TimerCheckpoint>>;

    /// Patch only `start_time` (pause bookkeeping).
    fn touch_start_time(
        &self,
        user: &UserId,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64>;

    /// Record that the timer was paused at `paused_at`. Any later `put`
    /// clears the marker.
    fn mark_paused(
        &self,
        user: &UserId,
        paused_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64>;

    /// Patch only `pending_session_id`.
    fn attach_session(
        &self,
        user: &UserId,
        session_id: i64,
        expected_version: Option<i64>,
    ) -> AppResult<i64>;

    /// Delete the row. `Ok(false)` when nothing matched.
    fn clear(&self, user: &UserId, expected_version: Option<i64>) -> AppResult<bool>;
}

impl CheckpointStore for DbPool {
    fn put(
        &self,
        user: &UserId,
        draft: &CheckpointDraft,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        let start = format_utc(start_time);

        match expected_version {
            None => {
                self.conn.execute(
                    "INSERT INTO active_timer (user_id, phase, start_time, duration_minutes,
                         break_duration, original_work_duration, pending_session_id, paused_at,
                         status, version)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, 1)
                     ON CONFLICT(user_id) DO UPDATE SET
                         phase = excluded.phase,
                         start_time = excluded.start_time,
                         duration_minutes = excluded.duration_minutes,
                         break_duration = excluded.break_duration,
                         original_work_duration = excluded.original_work_duration,
                         pending_session_id = excluded.pending_session_id,
                         paused_at = excluded.paused_at,
                         status = excluded.status,
                         version = active_timer.version + 1",
                    params![
                        user.as_str(),
                        draft.phase.to_db_str(),
                        start,
                        draft.duration_minutes,
                        draft.break_duration,
                        draft.original_work_duration,
                        draft.pending_session_id,
                        RUNNING_STATUS,
                    ],
                )?;
                current_version(&self.conn, user)
            }
            Some(v) => {
                let changed = self.conn.execute(
                    "UPDATE active_timer SET
                         phase = ?2,
                         start_time = ?3,
                         duration_minutes = ?4,
                         break_duration = ?5,
                         original_work_duration = ?6,
                         pending_session_id = ?7,
                         paused_at = NULL,
                         status = ?8,
                         version = version + 1
                     WHERE user_id = ?1 AND version = ?9",
                    params![
                        user.as_str(),
                        draft.phase.to_db_str(),
                        start,
                        draft.duration_minutes,
                        draft.break_duration,
                        draft.original_work_duration,
                        draft.pending_session_id,
                        RUNNING_STATUS,
                        v,
                    ],
                )?;
                ensure_changed(changed, user)?;
                Ok(v + 1)
            }
        }
    }

    fn get(&self, user: &UserId) -> AppResult<Option<TimerCheckpoint>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id, phase, start_time, duration_minutes, break_duration,
                    original_work_duration, pending_session_id, paused_at, status, version
             FROM active_timer
             WHERE user_id = ?1
             LIMIT 1",
        )?;

        let row = stmt.query_row([user.as_str()], map_row).optional()?;
        Ok(row)
    }

    fn touch_start_time(
        &self,
        user: &UserId,
        start_time: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        let changed = self.conn.execute(
            "UPDATE active_timer SET start_time = ?2, version = version + 1
             WHERE user_id = ?1 AND (?3 IS NULL OR version = ?3)",
            params![user.as_str(), format_utc(start_time), expected_version],
        )?;
        finish_patch(&self.conn, changed, user, expected_version)
    }

    fn mark_paused(
        &self,
        user: &UserId,
        paused_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        let changed = self.conn.execute(
            "UPDATE active_timer SET paused_at = ?2, version = version + 1
             WHERE user_id = ?1 AND (?3 IS NULL OR version = ?3)",
            params![user.as_str(), format_utc(paused_at), expected_version],
        )?;
        finish_patch(&self.conn, changed, user, expected_version)
    }

    fn attach_session(
        &self,
        user: &UserId,
        session_id: i64,
        expected_version: Option<i64>,
    ) -> AppResult<i64> {
        let changed = self.conn.execute(
            "UPDATE active_timer SET pending_session_id = ?2, version = version + 1
             WHERE user_id = ?1 AND (?3 IS NULL OR version = ?3)",
            params![user.as_str(), session_id, expected_version],
        )?;
        finish_patch(&self.conn, changed, user, expected_version)
    }

    fn clear(&self, user: &UserId, expected_version: Option<i64>) -> AppResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM active_timer WHERE user_id = ?1 AND (?2 IS NULL OR version = ?2)",
            params![user.as_str(), expected_version],
        )?;
        Ok(changed > 0)
    }
}

/// Number of users with a live checkpoint (used by `db --info`).
pub fn count_active(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM active_timer", [], |row| row.get(0))?;
    Ok(n)
}

fn current_version(conn: &Connection, user: &UserId) -> AppResult<i64> {
    let v = conn.query_row(
        "SELECT version FROM active_timer WHERE user_id = ?1",
        [user.as_str()],
        |row| row.get(0),
    )?;
    Ok(v)
}

fn ensure_changed(changed: usize, user: &UserId) -> AppResult<()> {
    if changed == 0 {
        Err(AppError::VersionConflict {
            user: user.to_string(),
        })
    } else {
        Ok(())
    }
}

fn finish_patch(
    conn: &Connection,
    changed: usize,
    user: &UserId,
    expected_version: Option<i64>,
) -> AppResult<i64> {
    match expected_version {
        Some(v) => {
            ensure_changed(changed, user)?;
            Ok(v + 1)
        }
        None if changed == 0 => Err(AppError::NoActiveTimer),
        None => current_version(conn, user),
    }
}

fn map_row(row: &Row) -> rusqlite::Result<TimerCheckpoint> {
    let phase_str: String = row.get("phase")?;
    let phase = Phase::from_db_str(&phase_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidPhase(phase_str.clone())),
        )
    })?;

    let start_str: String = row.get("start_time")?;
    let start_time = parse_utc(&start_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidTimestamp(start_str.clone())),
        )
    })?;

    let paused_str: Option<String> = row.get("paused_at")?;
    let paused_at = match paused_str {
        Some(s) => Some(parse_utc(&s).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                Box::new(AppError::InvalidTimestamp(s.clone())),
            )
        })?),
        None => None,
    };

    Ok(TimerCheckpoint {
        user_id: row.get("user_id")?,
        phase,
        start_time,
        duration_minutes: row.get("duration_minutes")?,
        break_duration: row.get("break_duration")?,
        original_work_duration: row.get("original_work_duration")?,
        pending_session_id: row.get("pending_session_id")?,
        paused_at,
        status: row.get("status")?,
        version: row.get("version")?,
    })
}
