use crate::config::Config;
use crate::core::engine::discard_checkpoint;
use crate::core::identity::{IdentityGate, StaticIdentity};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;

/// Drop the running timer without logging a session. Does nothing when no
/// user can be resolved.
pub fn handle(cfg: &Config, identity: &StaticIdentity) -> AppResult<()> {
    let gate = IdentityGate::new(identity.clone());
    let Some(user) = gate.resolve_optional() else {
        return Ok(());
    };

    let pool = DbPool::open(&cfg.database)?;
    if discard_checkpoint(&gate, &pool) {
        success(format!("Timer reset for '{}'.", user));
        ttlog_quiet(&pool.conn, "reset", user.as_str(), "Active timer discarded");
    }
    Ok(())
}
