//! Formatting utilities used for CLI and export outputs.

/// `01h 05m`, or `01:05` when `short` is set.
pub fn mins2readable(mins: i64, short: bool) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;

    if short {
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// `87.5%`, or `--` when there is nothing to measure.
pub fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| "--".to_string())
}

/// Horizontal bar of `width` cells scaled to `value / max`.
pub fn bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (value * width).div_ceil(max);
    "█".repeat(filled.min(width))
}
