//! Packing of (break minutes, original work minutes) into one integer.
//!
//! Older databases stored both values in the single spare `break_duration`
//! column of `active_timer` as `break * 1000 + work`. The current schema has
//! two real columns; this codec is only used to read that legacy layout.

pub const DEFAULT_BREAK_MINUTES: i64 = 5;
pub const DEFAULT_WORK_MINUTES: i64 = 25;

pub const MAX_BREAK_MINUTES: i64 = 60;
pub const MAX_WORK_MINUTES: i64 = 120;

const FACTOR: i64 = 1000;

/// `break_minutes * 1000 + work_minutes`.
pub fn encode(break_minutes: i64, work_minutes: i64) -> i64 {
    break_minutes * FACTOR + work_minutes
}

/// Inverse of [`encode`]. Missing values and components outside
/// `break ∈ [1, 60]`, `work ∈ [1, 120]` fall back to (5, 25) independently.
pub fn decode(value: Option<i64>) -> (i64, i64) {
    let Some(v) = value else {
        return (DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES);
    };

    let break_minutes = v.div_euclid(FACTOR);
    let work_minutes = v.rem_euclid(FACTOR);

    let break_minutes = if (1..=MAX_BREAK_MINUTES).contains(&break_minutes) {
        break_minutes
    } else {
        DEFAULT_BREAK_MINUTES
    };
    let work_minutes = if (1..=MAX_WORK_MINUTES).contains(&work_minutes) {
        work_minutes
    } else {
        DEFAULT_WORK_MINUTES
    };

    (break_minutes, work_minutes)
}
