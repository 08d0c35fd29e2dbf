use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::identity::UserId;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Login { user } = &cli.command {
        let user = UserId::new(user)
            .ok_or_else(|| AppError::Config("user identifier cannot be empty".into()))?;

        if cli.test {
            info(format!("Test mode: '{}' not written to the config file.", user));
        } else {
            Config::set_user(Some(user.as_str()))?;
            success(format!("Logged in as '{}'.", user));
        }

        if let Ok(pool) = DbPool::open(&cfg.database) {
            ttlog_quiet(&pool.conn, "login", user.as_str(), "User stored in config");
        }
    }
    Ok(())
}
