//! ANSI color helper utilities for terminal output.

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Efficiency colour:
/// ≥80% → green
/// ≥60% → yellow
/// otherwise → red
pub fn color_for_efficiency(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v >= 80.0 => GREEN,
        Some(v) if v >= 60.0 => YELLOW,
        Some(_) => RED,
        None => GREY,
    }
}

/// Wrap `value` in `color` unless it is empty.
pub fn paint(value: &str, color: &str) -> String {
    if value.trim().is_empty() {
        value.to_string()
    } else {
        format!("{color}{value}{RESET}")
    }
}
