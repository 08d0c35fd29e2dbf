use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::core::stats::{
    daily_breakdown, hourly_counts, peak_hour, streaks, summarize, weekly_work,
};
use crate::db::pool::DbPool;
use crate::db::sessions::{SessionFilter, load_sessions};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, info};
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW, color_for_efficiency, paint};
use crate::utils::formatting::{bar, mins2readable, percent};
use crate::utils::table::{Column, Table};
use chrono::{TimeDelta, Utc};

/// Days listed in the per-day breakdown.
const RECENT_DAYS: usize = 7;

pub fn handle(cmd: &Commands, cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    if let Commands::Stats { days } = cmd {
        let user = IdentityGate::new(identity.clone()).require()?;
        let pool = DbPool::open(&cfg.database)?;

        let filter = match days {
            Some(d) if *d <= 0 => {
                return Err(AppError::InvalidDate(format!("--days must be positive (got {d})")));
            }
            Some(d) => SessionFilter {
                since: Some(Utc::now() - TimeDelta::days(*d)),
                ..SessionFilter::default()
            },
            None => SessionFilter::default(),
        };

        let sessions = load_sessions(&pool.conn, &user, &filter)?;

        header(format!("Statistics for '{user}'"));
        if sessions.is_empty() {
            info("No sessions logged yet.");
            return Ok(());
        }

        let summary = summarize(&sessions);
        let eff_color = color_for_efficiency(summary.average_efficiency);

        println!("{CYAN}• Sessions:{RESET} {}", summary.total_sessions);
        println!(
            "{CYAN}• Logged time:{RESET} {} (work {}, break {})",
            mins2readable(summary.total_minutes(), false),
            mins2readable(summary.total_work_minutes, false),
            mins2readable(summary.total_break_minutes, false),
        );
        println!(
            "{CYAN}• Average efficiency:{RESET} {}",
            paint(&percent(summary.average_efficiency), eff_color)
        );
        println!(
            "{CYAN}• Completed:{RESET} {GREEN}{}{RESET} ({} min)",
            summary.completed_sessions, summary.completed_minutes
        );
        println!(
            "{CYAN}• Early stops:{RESET} {RED}{}{RESET} ({} min)",
            summary.early_stop_sessions, summary.early_stop_minutes
        );
        if summary.pending_sessions > 0 {
            println!(
                "{CYAN}• Waiting for break:{RESET} {YELLOW}{}{RESET}",
                summary.pending_sessions
            );
        }
        println!(
            "{CYAN}• Work / break:{RESET} {} / {}",
            percent(summary.work_percent()),
            percent(summary.break_percent())
        );

        let s = streaks(&sessions, Utc::now().date_naive());
        println!(
            "{CYAN}• Streak:{RESET} {} day(s), longest {} day(s)",
            s.current, s.longest
        );

        println!();
        header("Daily focus");
        let mut daily = Table::new(vec![
            Column::left("Day"),
            Column::right("Sessions"),
            Column::right("Completed"),
            Column::right("Work"),
            Column::right("Break"),
        ]);
        let days = daily_breakdown(&sessions);
        for d in days.iter().rev().take(RECENT_DAYS).rev() {
            daily.add_row(vec![
                d.date.to_string(),
                d.sessions.to_string(),
                d.completed.to_string(),
                mins2readable(d.work_minutes, true),
                mins2readable(d.break_minutes, true),
            ]);
        }
        print!("{}", daily.render(&cfg.separator_char));

        println!();
        header("Work per ISO week");
        let mut weekly = Table::new(vec![Column::left("Week"), Column::right("Work")]);
        for w in weekly_work(&sessions) {
            weekly.add_row(vec![
                format!("{}-W{:02}", w.iso_year, w.iso_week),
                mins2readable(w.work_minutes, false),
            ]);
        }
        print!("{}", weekly.render(&cfg.separator_char));

        println!();
        header("Sessions by hour (UTC)");
        let hours = hourly_counts(&sessions);
        let max = hours.iter().copied().max().unwrap_or(0);
        for (h, n) in hours.iter().enumerate().filter(|(_, n)| **n > 0) {
            println!("{:02}:00 {:>4} {}", h, n, bar(*n, max, 30));
        }
        if let Some(peak) = peak_hour(&hours) {
            println!("\n{CYAN}• Peak hour:{RESET} {:02}:00", peak);
        }
    }
    Ok(())
}
