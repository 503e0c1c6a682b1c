//! Conversions between chrono values and their stored millisecond form.

use chrono::{DateTime, Duration, Utc};

/// Unix milliseconds for a timestamp.
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Timestamp from Unix milliseconds, if in range.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Interval from stored milliseconds, if in range.
pub fn interval_from_millis(ms: i64) -> Option<Duration> {
    Duration::try_milliseconds(ms)
}

/// Compact display form of an interval, e.g. `6d 6h` or `1d 18h 25m 55.2s`.
pub fn format_interval(interval: Duration) -> String {
    let total_ms = interval.num_milliseconds();
    if total_ms == 0 {
        return "0s".to_string();
    }

    let sign = if total_ms < 0 { "-" } else { "" };
    let mut rest = total_ms.unsigned_abs();
    let days = rest / 86_400_000;
    rest %= 86_400_000;
    let hours = rest / 3_600_000;
    rest %= 3_600_000;
    let minutes = rest / 60_000;
    rest %= 60_000;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if rest > 0 {
        let seconds = rest / 1000;
        let millis = rest % 1000;
        if millis == 0 {
            parts.push(format!("{seconds}s"));
        } else {
            let fraction = format!("{millis:03}");
            parts.push(format!("{seconds}.{}s", fraction.trim_end_matches('0')));
        }
    }

    format!("{sign}{}", parts.join(" "))
}
