use serde::Serialize;
use std::fmt;

/// Lifecycle tag of a row in the `sessions` log.
///
/// The DB strings are the historical ones so that existing dashboards keep
/// reading the table unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    /// Work phase logged, break not finished yet.
    WorkCompletePendingBreak,
    Completed,
    EarlyStop,
}

impl SessionStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::WorkCompletePendingBreak => "Work Completed",
            SessionStatus::Completed => "Completed",
            SessionStatus::EarlyStop => "Early Stop",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Work Completed" => Some(SessionStatus::WorkCompletePendingBreak),
            "Completed" => Some(SessionStatus::Completed),
            "Early Stop" => Some(SessionStatus::EarlyStop),
            _ => None,
        }
    }

    /// A pending row is still waiting for its break minutes.
    pub fn is_final(&self) -> bool {
        !matches!(self, SessionStatus::WorkCompletePendingBreak)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
