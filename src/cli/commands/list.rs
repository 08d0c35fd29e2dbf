use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::db::pool::DbPool;
use crate::db::sessions::{SessionFilter, load_sessions};
use crate::errors::{AppError, AppResult};
use crate::models::SessionRecord;
use crate::ui::messages::{header, info};
use crate::utils::formatting::percent;
use crate::utils::table::{Column, Table};
use chrono::{TimeDelta, Utc};

/// Sessions shown when neither `--last` nor `--days` is given.
const DEFAULT_LAST: usize = 10;

pub fn handle(cmd: &Commands, cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    if let Commands::List { last, days } = cmd {
        let user = IdentityGate::new(identity.clone()).require()?;
        let pool = DbPool::open(&cfg.database)?;

        let (filter, title) = match (last, days) {
            (_, Some(d)) => {
                if *d <= 0 {
                    return Err(AppError::InvalidDate(format!("--days must be positive (got {d})")));
                }
                (
                    SessionFilter {
                        since: Some(Utc::now() - TimeDelta::days(*d)),
                        until: None,
                        limit: *last,
                    },
                    format!("Sessions from the last {d} days"),
                )
            }
            (Some(n), None) => (
                SessionFilter {
                    limit: Some(*n),
                    ..SessionFilter::default()
                },
                format!("Last {n} sessions"),
            ),
            (None, None) => (
                SessionFilter {
                    limit: Some(DEFAULT_LAST),
                    ..SessionFilter::default()
                },
                format!("Last {DEFAULT_LAST} sessions"),
            ),
        };

        let sessions = load_sessions(&pool.conn, &user, &filter)?;

        header(format!("{title} for '{user}'"));
        if sessions.is_empty() {
            info("No sessions logged yet.");
            return Ok(());
        }

        print!("{}", render_sessions(&sessions, &cfg.separator_char));
    }
    Ok(())
}

fn render_sessions(sessions: &[SessionRecord], separator: &str) -> String {
    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("Logged at (UTC)"),
        Column::right("Work"),
        Column::right("Break"),
        Column::right("Total"),
        Column::left("Status"),
        Column::right("Eff."),
    ]);

    for s in sessions {
        table.add_row(vec![
            s.id.to_string(),
            s.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            format!("{} min", s.work_minutes),
            format!("{} min", s.break_minutes),
            format!("{} min", s.total_minutes()),
            s.status.to_string(),
            percent(s.efficiency()),
        ]);
    }

    table.render(separator)
}
