//! Session identity gate.
//!
//! Every timer operation needs a resolved user before it may touch storage.
//! Mutating operations fail with [`AppError::AuthRequired`]; best-effort
//! cleanup paths use [`IdentityGate::resolve_optional`] and simply do nothing.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;

/// Environment variable consulted when no `--user` flag is given.
pub const USER_ENV_VAR: &str = "POMODASH_USER";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for blank identifiers.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External collaborator that knows who is using the timer.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity fixed at process start from flag, environment or config file.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    pub fn new(user: Option<&str>) -> Self {
        Self {
            user: user.and_then(UserId::new),
        }
    }

    /// Precedence: `--user` flag, then `POMODASH_USER`, then the config file.
    pub fn from_sources(flag: Option<&str>, cfg: &Config) -> Self {
        let from_env = env::var(USER_ENV_VAR).ok();

        let user = flag
            .and_then(UserId::new)
            .or_else(|| from_env.as_deref().and_then(UserId::new))
            .or_else(|| cfg.user.as_deref().and_then(UserId::new));

        Self { user }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

pub struct IdentityGate<P: IdentityProvider> {
    provider: P,
}

impl<P: IdentityProvider> IdentityGate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn require(&self) -> AppResult<UserId> {
        self.provider.current_user().ok_or(AppError::AuthRequired)
    }

    pub fn resolve_optional(&self) -> Option<UserId> {
        self.provider.current_user()
    }
}
