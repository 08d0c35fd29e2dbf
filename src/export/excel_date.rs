use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Number format applied to exported session timestamps.
const TIMESTAMP_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Turn an exported `YYYY-MM-DD HH:MM:SS` timestamp into an Excel serial,
/// together with the number format to display it with.
pub(crate) fn parse_to_excel_date(s: &str) -> Option<(&'static str, f64)> {
    let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    Some((TIMESTAMP_FORMAT, excel_serial(dt)?))
}

/// Days since 1899-12-30, fractional part for the time of day.
fn excel_serial(dt: NaiveDateTime) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let since: TimeDelta = dt - epoch;
    Some(since.num_seconds() as f64 / 86_400.0)
}
