use crate::cli::commands::activation::with_engine;
use crate::config::Config;
use crate::core::identity::StaticIdentity;
use crate::core::timer::format_remaining;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::colors::{CYAN, GREEN, RESET, YELLOW};

pub fn handle(cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    with_engine(identity, cfg, |_pool, engine| {
        let Some(remaining) = engine.remaining() else {
            info("No active timer.");
            return Ok(());
        };
        let Some(session) = engine.session() else {
            return Ok(());
        };

        let color = if session.phase.is_work() { GREEN } else { CYAN };

        println!(
            "{}• Phase:{} {}{}{}",
            CYAN, RESET, color, session.phase, RESET
        );
        println!(
            "{}• Remaining:{} {}{}{}{}",
            CYAN,
            RESET,
            YELLOW,
            format_remaining(remaining),
            RESET,
            if session.paused { " (paused)" } else { "" }
        );
        println!(
            "{}• Cycle:{} {} min work / {} min break",
            CYAN, RESET, session.original_work_duration, session.break_duration
        );
        Ok(())
    })
}
