use serde::Serialize;
use std::fmt;

/// The two halves of a pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Work" => Some(Phase::Work),
            "Break" => Some(Phase::Break),
            _ => None,
        }
    }

    pub fn is_work(&self) -> bool {
        matches!(self, Phase::Work)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}
