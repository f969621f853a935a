//! Epoch-second helpers shared by the aggregator and the terminal views.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Fixed offset from UTC in minutes. Out-of-range values fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(utc_offset)
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Convert seconds since the epoch to a zoned datetime.
/// Timestamps chrono cannot represent clamp to the epoch.
pub fn at_offset(timestamp: i64, offset: FixedOffset) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

/// "Jun 10, 2024 06:13"
pub fn format_timestamp(timestamp: i64, offset: FixedOffset) -> String {
    at_offset(timestamp, offset)
        .format("%b %d, %Y %H:%M")
        .to_string()
}
