//! Time utilities: RFC 3339 storage format and parsing of legacy timestamps.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Storage format for every instant written to the database.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 instant, or a naive ISO timestamp which is taken as UTC
/// (rows written by older clients carry no offset).
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
