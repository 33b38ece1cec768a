//! Time source used for build timestamps and step timing

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a timestamp the way it is stored in layer metadata
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Time elapsed between two readings, clamped at zero
pub fn elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or_default()
}

/// Format a duration for the build log (e.g. "1.52s", "340.00ms")
pub fn format_duration(duration: Duration) -> String {
    format!("{:.2?}", duration)
}
