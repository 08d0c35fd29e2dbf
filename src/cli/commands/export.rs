use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::export::ExportLogic;

pub fn handle(cmd: &Commands, cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        force,
    } = cmd
    {
        let user = IdentityGate::new(identity.clone()).require()?;
        let pool = DbPool::open(&cfg.database)?;
        ExportLogic::export(&pool, &user, *format, file, range.as_deref(), *force)?;
    }
    Ok(())
}
