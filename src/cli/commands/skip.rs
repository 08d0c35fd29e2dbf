use crate::cli::commands::activation::{describe, with_engine};
use crate::cli::commands::watch::audit_transition;
use crate::config::Config;
use crate::core::identity::StaticIdentity;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    with_engine(identity, cfg, |pool, engine| {
        let t = engine.skip_to_break()?;
        success(describe(&t));
        audit_transition(pool, engine.user().as_str(), &t);
        Ok(())
    })
}
