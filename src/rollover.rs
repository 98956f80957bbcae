//! Calendar-day boundary detection.
//!
//! Days are keyed by their UTC date. The session checks for a rollover every
//! minute and whenever it resumes after a long input pause.

use crate::journal::date_key_for;
use chrono::{DateTime, Utc};

/// Returns the new date key if `now` falls on a different day than `previous_key`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use daybook::rollover::detect_rollover;
///
/// let midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
/// assert_eq!(detect_rollover("2024-01-01", midnight).as_deref(), Some("2024-01-02"));
/// assert_eq!(detect_rollover("2024-01-02", midnight), None);
/// ```
pub fn detect_rollover(previous_key: &str, now: DateTime<Utc>) -> Option<String> {
    let current = date_key_for(now);
    if current == previous_key {
        None
    } else {
        Some(current)
    }
}

/// A detected change of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    pub previous: String,
    pub current: String,
}

/// Tracks the day the session is writing into.
#[derive(Debug, Clone)]
pub struct DayRollover {
    current: String,
}

impl DayRollover {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current: date_key_for(now),
        }
    }

    pub fn current_key(&self) -> &str {
        &self.current
    }

    /// Advances to the day containing `now`, reporting the change if any.
    pub fn check(&mut self, now: DateTime<Utc>) -> Option<Rollover> {
        let current = detect_rollover(&self.current, now)?;
        let previous = std::mem::replace(&mut self.current, current.clone());
        Some(Rollover { previous, current })
    }
}
