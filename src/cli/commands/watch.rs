use crate::cli::commands::activation::{CliEngine, describe, with_engine};
use crate::config::Config;
use crate::core::engine::Transition;
use crate::core::identity::StaticIdentity;
use crate::core::watch::{WatchEvent, WatchExit, run_loop, spawn_stdin_reader};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{countdown, error, info, success, warning};
use std::time::Duration;

pub fn handle(cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    with_engine(identity, cfg, |pool, engine| {
        if engine.is_idle() {
            info("No active timer. Start one with `pomodash start`.");
            return Ok(());
        }
        follow(pool, engine, cfg)
    })
}

/// Run the interactive countdown until the timer ends or the user quits.
pub(crate) fn follow(pool: &DbPool, engine: &mut CliEngine<'_>, cfg: &Config) -> AppResult<()> {
    info("Commands: p=pause  r=resume  k=skip to break  s=stop  q=quit (timer keeps running)");

    let input = spawn_stdin_reader();
    let interval = Duration::from_millis(cfg.tick_interval_ms.max(50));
    let user = engine.user().to_string();

    let exit = run_loop(engine, &input, interval, |event| render(pool, &user, event));

    println!();
    match exit {
        WatchExit::Finished => info("Timer is idle."),
        WatchExit::Detached => info("Detached. The timer carries on in the background (a pause is kept); check it with `pomodash status`."),
    }
    Ok(())
}

fn render(pool: &DbPool, user: &str, event: WatchEvent) {
    match event {
        WatchEvent::Tick(t @ Transition::Running { .. }) => {
            countdown(describe(&t));
        }
        WatchEvent::Tick(Transition::Idle) => {}
        WatchEvent::Tick(t) => {
            println!();
            success(describe(&t));
            audit_transition(pool, user, &t);
        }
        WatchEvent::Applied(_, t) => {
            println!();
            success(describe(&t));
            audit_transition(pool, user, &t);
        }
        WatchEvent::Rejected(cmd, e) => {
            println!();
            error(format!("{cmd:?}: {e}"));
        }
        WatchEvent::Unknown(line) => {
            println!();
            warning(format!("Unknown command '{}'", line.trim()));
        }
        WatchEvent::Warning(w) => {
            println!();
            warning(w);
        }
    }
}

/// Audit entries for transitions that changed the session log.
pub(crate) fn audit_transition(pool: &DbPool, user: &str, t: &Transition) {
    let op = match t {
        Transition::Stopped { .. } => "stop",
        Transition::SkippedToBreak { .. } => "skip",
        Transition::BreakStarted { .. } | Transition::CycleCompleted { .. } => "complete",
        _ => return,
    };
    ttlog_quiet(&pool.conn, op, user, &describe(t));
}
