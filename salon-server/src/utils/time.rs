//! Time conversion helpers
//!
//! Instants cross the API as `DateTime<Utc>`; the repository layer
//! stores them as `i64` Unix millis.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// `DateTime<Utc>` → Unix millis
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Unix millis → `DateTime<Utc>`, `None` when out of chrono's range
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// `start + minutes`, `None` on overflow
pub fn add_minutes(start: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|d| start.checked_add_signed(d))
}
