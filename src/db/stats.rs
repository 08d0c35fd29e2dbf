use crate::db::checkpoint::count_active;
use crate::db::pool::DbPool;
use crate::db::sessions::count_sessions;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::time::parse_utc;
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) TOTALS
    //
    let count = count_sessions(&pool.conn)?;
    println!(
        "{}• Logged sessions:{} {}{}{}",
        CYAN, RESET, GREEN, count, RESET
    );

    let active = count_active(&pool.conn)?;
    println!(
        "{}• Active timers:{} {}{}{}",
        CYAN, RESET, GREEN, active, RESET
    );

    //
    // 3) DATE RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT timestamp FROM sessions ORDER BY timestamp ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT timestamp FROM sessions ORDER BY timestamp DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let first_date = first.as_deref().and_then(parse_utc).map(|d| d.date_naive());
    let last_date = last.as_deref().and_then(parse_utc).map(|d| d.date_naive());

    let fmt_first = first_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Date range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE SESSIONS/DAY
    //
    if let (Some(d1), Some(d2)) = (first_date, last_date) {
        let days = (d2 - d1).num_days().max(1);

        let avg = count as f64 / days as f64;
        println!("{}• Average sessions/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}
