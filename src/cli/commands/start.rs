use crate::cli::commands::activation::{describe, with_engine};
use crate::cli::commands::watch::follow;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::identity::StaticIdentity;
use crate::db::log::ttlog_quiet;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    if let Commands::Start {
        work,
        break_minutes,
        watch,
    } = cmd
    {
        let work = work.unwrap_or(cfg.default_work_minutes);
        let brk = break_minutes.unwrap_or(cfg.default_break_minutes);

        with_engine(identity, cfg, |pool, engine| {
            let t = engine.start(work, brk)?;
            success(describe(&t));
            ttlog_quiet(
                &pool.conn,
                "start",
                engine.user().as_str(),
                &format!("work {work} min, break {brk} min"),
            );

            if *watch {
                follow(pool, engine, cfg)?;
            }
            Ok(())
        })?;
    }

    Ok(())
}
