//! Common display utilities and helpers

use chrono::{DateTime, Utc};

/// Render a signed difference from the target's point of view.
///
/// Positive means the target is missing items, negative means it has extra.
pub fn format_difference(difference: i64) -> String {
    match difference {
        d if d > 0 => format!("Missing: {}", d),
        d if d < 0 => format!("Extra: {}", d.unsigned_abs()),
        _ => "-".to_string(),
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:MM UTC`
pub fn format_utc_minute(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}
