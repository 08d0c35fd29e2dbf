use crate::models::session_status::SessionStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the append-only `sessions` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: String,
    pub work_minutes: i64,
    pub break_minutes: i64,
    pub status: SessionStatus,
    /// Creation instant; approximates the end of the session.
    pub timestamp: DateTime<Utc>,
}

impl SessionRecord {
    pub fn total_minutes(&self) -> i64 {
        self.work_minutes + self.break_minutes
    }

    /// Share of the session spent working, in percent. `None` for empty rows.
    pub fn efficiency(&self) -> Option<f64> {
        let total = self.total_minutes();
        if total <= 0 {
            None
        } else {
            Some(self.work_minutes as f64 / total as f64 * 100.0)
        }
    }
}
