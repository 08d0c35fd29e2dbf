use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::engine::discard_checkpoint;
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

pub fn handle(cli: &Cli, cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    if let Commands::Logout { discard_timer } = &cli.command {
        let gate = IdentityGate::new(identity.clone());
        let user = gate.resolve_optional();

        if *discard_timer && user.is_some() {
            let pool = DbPool::open(&cfg.database)?;
            if discard_checkpoint(&gate, &pool) {
                info("Running timer discarded.");
            }
        }

        if cli.test {
            info("Test mode: config file left untouched.");
        } else {
            Config::set_user(None)?;
        }

        match user {
            Some(u) => {
                success(format!("Logged out '{}'.", u));
                if let Ok(pool) = DbPool::open(&cfg.database) {
                    ttlog_quiet(&pool.conn, "logout", u.as_str(), "User removed from config");
                }
            }
            None => info("No user was logged in."),
        }
    }
    Ok(())
}
