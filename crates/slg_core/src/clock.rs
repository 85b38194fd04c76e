//! Wall-clock abstraction.
//!
//! Engines never read the system time directly, so every time-dependent rule
//! can be driven from tests.

/// Source of the current time in unix seconds.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> i64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Format unix seconds as `YYYY-MM-DD HH:MM` (UTC) for messages.
#[must_use]
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map_or_else(|| ts.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Format unix seconds as `HH:MM` (UTC).
#[must_use]
pub fn format_time_of_day(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map_or_else(|| ts.to_string(), |dt| dt.format("%H:%M").to_string())
}

/// Whether two timestamps fall on the same UTC calendar day.
#[must_use]
pub fn same_utc_day(a: i64, b: i64) -> bool {
    match (
        chrono::DateTime::from_timestamp(a, 0),
        chrono::DateTime::from_timestamp(b, 0),
    ) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}
