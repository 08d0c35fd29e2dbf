use crate::core::backup::zip_file;
use crate::core::encoder;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::path::Path;

const SPLIT_DURATIONS_VERSION: &str = "20250701_0001_split_encoded_durations";
const PAUSE_MARKER_VERSION: &str = "20250815_0002_active_timer_paused_at";

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create the append-only session log.
fn create_sessions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            work_minutes  INTEGER NOT NULL DEFAULT 0 CHECK(work_minutes >= 0),
            break_minutes INTEGER NOT NULL DEFAULT 0 CHECK(break_minutes >= 0),
            status        TEXT NOT NULL
                          CHECK(status IN ('Work Completed','Completed','Early Stop')),
            timestamp     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_ts ON sessions(user_id, timestamp);
        "#,
    )?;
    Ok(())
}

/// Create the one-row-per-user checkpoint table (modern layout).
fn create_active_timer_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS active_timer (
            user_id                TEXT PRIMARY KEY,
            phase                  TEXT NOT NULL CHECK(phase IN ('Work','Break')),
            start_time             TEXT NOT NULL,
            duration_minutes       INTEGER NOT NULL,
            break_duration         INTEGER NOT NULL,
            original_work_duration INTEGER NOT NULL,
            pending_session_id     INTEGER,
            paused_at              TEXT,
            status                 TEXT NOT NULL DEFAULT 'running',
            version                INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )?;
    Ok(())
}

/// Legacy layout: `break_duration` holds `break * 1000 + work` and there is
/// no `original_work_duration` column. Rebuild the table and decode each row.
fn migrate_split_encoded_durations(conn: &Connection) -> AppResult<()> {
    if table_has_column(conn, "active_timer", "original_work_duration")? {
        return Ok(());
    }

    warning("Legacy active_timer layout detected — splitting encoded durations...");
    backup_before_migration(conn)?;

    let tx = conn.unchecked_transaction()?;

    tx.execute_batch("ALTER TABLE active_timer RENAME TO active_timer_legacy;")?;
    create_active_timer_table(&tx)?;

    let legacy: Vec<(String, String, String, i64, Option<i64>)> = {
        let mut stmt = tx.prepare(
            "SELECT user_id, phase, start_time, duration_minutes, break_duration
             FROM active_timer_legacy",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        out
    };

    for (user_id, phase, start_time, duration, encoded) in &legacy {
        let (break_minutes, work_minutes) = encoder::decode(*encoded);
        tx.execute(
            "INSERT INTO active_timer (user_id, phase, start_time, duration_minutes,
                 break_duration, original_work_duration, pending_session_id, status, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, 'running', 1)",
            params![user_id, phase, start_time, duration, break_minutes, work_minutes],
        )?;
    }

    tx.execute_batch("DROP TABLE active_timer_legacy;")?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![
            Local::now().to_rfc3339(),
            SPLIT_DURATIONS_VERSION,
            format!(
                "Split encoded break/work durations into columns ({} timer rows)",
                legacy.len()
            ),
        ],
    )?;

    tx.commit()?;

    success(format!(
        "Migration applied: {} → active_timer now stores break and work targets separately",
        SPLIT_DURATIONS_VERSION
    ));

    Ok(())
}

fn backup_before_migration(conn: &Connection) -> AppResult<()> {
    let db_path: String = conn
        .query_row("PRAGMA database_list;", [], |row| row.get::<_, String>(2))
        .unwrap_or_default();

    if db_path.is_empty() {
        warning("Could not determine DB path — backup skipped.");
        return Ok(());
    }

    let src = Path::new(&db_path);
    let backup_name = format!(
        "{}-backup_db_pre_split_durations.zip",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let backup_path = match src.parent() {
        Some(dir) => dir.join(&backup_name),
        None => Path::new(&backup_name).to_path_buf(),
    };

    zip_file(src, &backup_path, "database.sqlite")?;
    success(format!("📦 Backup created: {}", backup_path.display()));
    Ok(())
}

/// Checkpoints written before pauses were persisted have no `paused_at`.
fn add_pause_marker(conn: &Connection) -> AppResult<()> {
    if table_has_column(conn, "active_timer", "paused_at")? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE active_timer ADD COLUMN paused_at TEXT;")?;
    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![
            Local::now().to_rfc3339(),
            PAUSE_MARKER_VERSION,
            "Added active_timer.paused_at",
        ],
    )?;
    tx.commit()?;

    success(format!("Migration applied: {PAUSE_MARKER_VERSION}"));
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked every time the database is opened; every step is idempotent.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Session log
    create_sessions_table(conn)?;

    // 3) Checkpoints: create or upgrade the legacy layout
    if table_exists(conn, "active_timer")? {
        migrate_split_encoded_durations(conn)?;
        add_pause_marker(conn)?;
    } else {
        create_active_timer_table(conn)?;
    }

    Ok(())
}
