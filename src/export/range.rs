use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Parse `--range`.
///
/// Accepted forms:
/// - `YYYY`
/// - `YYYY-MM`
/// - `YYYY-MM-DD`
/// - `A:B` where both sides use one of the forms above, with equal length
///
/// Returns the first and last day covered, both inclusive.
pub fn parse_range(r: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let r = r.trim();

    let (first, last) = match r.split_once(':') {
        Some((start_raw, end_raw)) => {
            let start = start_raw.trim();
            let end = end_raw.trim();

            if start.len() != end.len() {
                return Err(invalid(r, "start and end must have the same format"));
            }

            let (d1, _) = parse_period(start)?;
            let (_, d2) = parse_period(end)?;
            (d1, d2)
        }
        None => parse_period(r)?,
    };

    if first > last {
        return Err(invalid(r, "start is after end"));
    }
    Ok((first, last))
}

/// `[since, until)` in UTC for an inclusive day range.
pub fn utc_bounds(first: NaiveDate, last: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let since = first.and_time(chrono::NaiveTime::MIN).and_utc();
    let until = (last + TimeDelta::days(1))
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();
    (since, until)
}

fn parse_period(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    match p.len() {
        // YYYY
        4 => {
            let y: i32 = p.parse().map_err(|_| invalid(p, "invalid year"))?;
            let d1 = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(|| invalid(p, "invalid year"))?;
            let d2 =
                NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(|| invalid(p, "invalid year"))?;
            Ok((d1, d2))
        }
        // YYYY-MM
        7 => {
            let d1 = NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d")
                .map_err(|_| invalid(p, "invalid month"))?;
            let last = month_last_day(d1).ok_or_else(|| invalid(p, "invalid month"))?;
            Ok((d1, last))
        }
        // YYYY-MM-DD
        10 => {
            let d = NaiveDate::parse_from_str(p, "%Y-%m-%d")
                .map_err(|_| invalid(p, "invalid date"))?;
            Ok((d, d))
        }
        _ => Err(invalid(p, "unsupported range format")),
    }
}

fn month_last_day(first: NaiveDate) -> Option<NaiveDate> {
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
}

fn invalid(input: &str, why: &str) -> AppError {
    AppError::InvalidDate(format!("{input}: {why}"))
}
