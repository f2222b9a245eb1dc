//! Time source and organization-local date-time helpers.
//!
//! # Responsibility
//! - Provide an injectable clock so lifecycle rules are testable.
//! - Parse caller-local timestamps and render them in the organization zone.
//!
//! # Invariants
//! - Every instant leaving this module is UTC.
//! - Displayed timestamps always use `dd/mm/yyyy HH:MM` in the given zone.

use chrono::{DateTime, Days, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Current-time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Parses a caller-supplied timestamp into UTC.
///
/// Accepts RFC 3339 with an explicit offset. Offset-less values are read as
/// wall-clock time in `tz`; a wall time skipped by a DST jump is rejected.
pub fn parse_local_datetime(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(trimmed, format).ok()?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    })
}

/// Renders `instant` as `dd/mm/yyyy HH:MM` in `tz`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DISPLAY_FORMAT).to_string()
}

/// Adds calendar days in `tz`, keeping the local wall time across DST shifts.
pub fn add_local_days(instant: DateTime<Utc>, tz: Tz, days: u64) -> Option<DateTime<Utc>> {
    instant
        .with_timezone(&tz)
        .checked_add_days(Days::new(days))
        .map(|local| local.with_timezone(&Utc))
}
