use crate::models::SessionRecord;
use serde::Serialize;

/// Flat row written by every export format.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SessionExport {
    pub id: i64,
    pub user_id: String,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub timestamp: String,
    pub work_minutes: i64,
    pub break_minutes: i64,
    pub total_minutes: i64,
    pub status: String,
    /// Rounded to one decimal; empty for rows with no minutes.
    pub efficiency: Option<f64>,
}

impl From<&SessionRecord> for SessionExport {
    fn from(r: &SessionRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id.clone(),
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            work_minutes: r.work_minutes,
            break_minutes: r.break_minutes,
            total_minutes: r.total_minutes(),
            status: r.status.to_db_str().to_string(),
            efficiency: r.efficiency().map(|e| (e * 10.0).round() / 10.0),
        }
    }
}

pub(crate) fn get_headers() -> Vec<&'static str> {
    vec![
        "id",
        "user_id",
        "timestamp",
        "work_minutes",
        "break_minutes",
        "total_minutes",
        "status",
        "efficiency",
    ]
}

pub(crate) fn session_to_row(s: &SessionExport) -> Vec<String> {
    vec![
        s.id.to_string(),
        s.user_id.clone(),
        s.timestamp.clone(),
        s.work_minutes.to_string(),
        s.break_minutes.to_string(),
        s.total_minutes.to_string(),
        s.status.clone(),
        s.efficiency.map(|e| format!("{e:.1}")).unwrap_or_default(),
    ]
}
