//! Automatic analysis scheduling.
//!
//! The scheduler decides when the current entry should be re-analyzed. It keeps
//! two counters, the time of the last successful analysis and the character
//! total at that moment, and triggers when either enough new text was written
//! or enough time has passed:
//!
//! ```text
//! newChars = totalChars - lastAnalysisCharCount
//! elapsed  = now - lastAnalysisTime
//! trigger  = newChars >= charThreshold || elapsed >= timeThreshold
//! ```
//!
//! Counters only move forward after a successful run, so a failed run is
//! retried on the next tick. At most one analysis is in flight at a time.

pub mod clock;
pub mod tasks;

use crate::constants::{
    DEFAULT_CHAR_THRESHOLD, DEFAULT_TIME_THRESHOLD_SECS, KEY_ANALYSIS_COUNTERS,
    KEY_AUTO_ANALYSIS_CHARS, KEY_AUTO_ANALYSIS_TIME, MAX_COUNTER_AGE_MS,
};
use crate::errors::{AppError, AppResult};
use crate::storage::{read_json, write_json, BlobStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Time and character total of the last successful analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCounters {
    pub last_analysis_time: DateTime<Utc>,
    pub last_analysis_char_count: usize,
}

impl AnalysisCounters {
    /// Counters for a session that has analyzed nothing yet.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            last_analysis_time: now,
            last_analysis_char_count: 0,
        }
    }

    /// True when `last_analysis_time` lies within the 24 hours before `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let age = now - self.last_analysis_time;
        age >= Duration::zero() && age <= Duration::milliseconds(MAX_COUNTER_AGE_MS)
    }

    /// Returns these counters, or fresh ones if they are out of range.
    pub fn normalized(self, now: DateTime<Utc>) -> Self {
        if self.is_valid_at(now) {
            self
        } else {
            Self::fresh(now)
        }
    }
}

/// Trigger thresholds for automatic analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub char_threshold: usize,
    pub time_threshold: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            char_threshold: DEFAULT_CHAR_THRESHOLD,
            time_threshold: Duration::seconds(DEFAULT_TIME_THRESHOLD_SECS),
        }
    }
}

impl AnalysisConfig {
    /// Reads the thresholds from the blob store.
    ///
    /// Missing values use the defaults. Values that are not positive integers
    /// are logged and also replaced by the defaults.
    pub fn load(blobs: &dyn BlobStore) -> Self {
        let defaults = Self::default();
        let char_threshold = read_positive(blobs, KEY_AUTO_ANALYSIS_CHARS)
            .unwrap_or(defaults.char_threshold);
        let time_threshold = read_positive::<i64>(blobs, KEY_AUTO_ANALYSIS_TIME)
            .and_then(|secs| {
                let threshold = Duration::try_seconds(secs);
                if threshold.is_none() {
                    warn!(
                        "Time threshold {}s out of range for '{}', using default",
                        secs, KEY_AUTO_ANALYSIS_TIME
                    );
                }
                threshold
            })
            .unwrap_or(defaults.time_threshold);

        Self {
            char_threshold,
            time_threshold,
        }
    }

    /// Writes both thresholds to the blob store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a zero threshold, or the storage error.
    pub fn save(&self, blobs: &dyn BlobStore) -> AppResult<()> {
        if self.char_threshold == 0 || self.time_threshold <= Duration::zero() {
            return Err(AppError::Config(
                "Analysis thresholds must be greater than zero".to_string(),
            ));
        }
        blobs.set(KEY_AUTO_ANALYSIS_CHARS, &self.char_threshold.to_string())?;
        blobs.set(
            KEY_AUTO_ANALYSIS_TIME,
            &self.time_threshold.num_seconds().to_string(),
        )?;
        Ok(())
    }
}

fn read_positive<T>(blobs: &dyn BlobStore, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default + Copy + fmt::Display,
{
    let raw = match blobs.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read '{}', using default: {}", key, e);
            return None;
        }
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!("Invalid value '{}' for '{}', using default", raw.trim(), key);
            None
        }
    }
}

/// Why a tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCredential,
    NoContent,
}

/// Display-only view of how close the next analysis is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Characters written since the last analysis. Negative if text shrank.
    pub new_chars: i64,
    pub chars_until_next: i64,
    pub elapsed: Duration,
    pub time_until_next: Duration,
    pub ready: bool,
}

/// What a scheduler tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Preconditions not met; nothing happened.
    Skipped(SkipReason),
    /// An analysis is already running.
    InFlight,
    /// Thresholds not reached yet.
    Waiting(Progress),
    /// Thresholds reached; an analysis should start.
    Trigger(Progress),
}

/// Inputs of a tick, captured from the current entry and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInput {
    pub has_credential: bool,
    pub has_content: bool,
    pub total_chars: usize,
}

/// Counter bookkeeping and trigger decisions for automatic analysis.
#[derive(Debug, Clone)]
pub struct AutoAnalysisScheduler {
    counters: AnalysisCounters,
    in_flight: bool,
}

impl AutoAnalysisScheduler {
    pub fn new(counters: AnalysisCounters) -> Self {
        Self {
            counters,
            in_flight: false,
        }
    }

    /// Restores persisted counters, normalizing missing or corrupted values.
    pub fn load(blobs: &dyn BlobStore, now: DateTime<Utc>) -> Self {
        let counters = match read_json::<AnalysisCounters>(blobs, KEY_ANALYSIS_COUNTERS) {
            Ok(Some(counters)) => {
                let normalized = counters.normalized(now);
                if normalized != counters {
                    warn!("Stored analysis counters out of range, resetting");
                }
                normalized
            }
            Ok(None) => AnalysisCounters::fresh(now),
            Err(e) => {
                warn!("Failed to read analysis counters, resetting: {}", e);
                AnalysisCounters::fresh(now)
            }
        };
        Self::new(counters)
    }

    /// Persists the counters.
    pub fn persist(&self, blobs: &dyn BlobStore) -> AppResult<()> {
        write_json(blobs, KEY_ANALYSIS_COUNTERS, &self.counters)
    }

    pub fn counters(&self) -> AnalysisCounters {
        self.counters
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Resets out-of-range counters. Returns true if they were reset.
    pub fn normalize(&mut self, now: DateTime<Utc>) -> bool {
        let normalized = self.counters.normalized(now);
        if normalized == self.counters {
            return false;
        }
        warn!(
            "Analysis counters out of range (last analysis {}), resetting",
            self.counters.last_analysis_time
        );
        self.counters = normalized;
        true
    }

    /// Computes progress toward the next analysis without touching counters.
    ///
    /// Out-of-range counters are evaluated as if freshly reset at `now`.
    pub fn progress(
        &self,
        now: DateTime<Utc>,
        total_chars: usize,
        config: &AnalysisConfig,
    ) -> Progress {
        let counters = self.counters.normalized(now);
        let new_chars = total_chars as i64 - counters.last_analysis_char_count as i64;
        let elapsed = now - counters.last_analysis_time;
        let threshold = config.char_threshold as i64;

        Progress {
            new_chars,
            chars_until_next: (threshold - new_chars).max(0),
            elapsed,
            time_until_next: (config.time_threshold - elapsed).max(Duration::zero()),
            ready: new_chars >= threshold || elapsed >= config.time_threshold,
        }
    }

    /// Runs one periodic check.
    ///
    /// Skips when there is no credential or no content. Otherwise normalizes
    /// the counters, reports `InFlight` while an analysis runs, and compares
    /// progress against the thresholds.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        input: TickInput,
        config: &AnalysisConfig,
    ) -> TickDecision {
        if !input.has_credential {
            return TickDecision::Skipped(SkipReason::NoCredential);
        }
        if !input.has_content {
            return TickDecision::Skipped(SkipReason::NoContent);
        }

        self.normalize(now);

        if self.in_flight {
            debug!("Analysis already in flight, skipping tick");
            return TickDecision::InFlight;
        }

        let progress = self.progress(now, input.total_chars, config);
        if progress.ready {
            info!(
                "Auto-analysis triggered ({} new chars, {}s elapsed)",
                progress.new_chars,
                progress.elapsed.num_seconds()
            );
            TickDecision::Trigger(progress)
        } else {
            TickDecision::Waiting(progress)
        }
    }

    /// Marks an analysis as started. Returns false if one is already running.
    pub fn begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Records a successful analysis of the current entry.
    pub fn complete(&mut self, completed_at: DateTime<Utc>, chars_at_call: usize) {
        self.in_flight = false;
        self.counters = AnalysisCounters {
            last_analysis_time: completed_at,
            last_analysis_char_count: chars_at_call,
        };
        debug!(
            "Analysis counters reset to {} chars at {}",
            chars_at_call, completed_at
        );
    }

    /// Clears the in-flight flag, leaving counters untouched.
    pub fn abandon(&mut self) {
        self.in_flight = false;
    }

    /// Starts counting from zero at `now`, as on a new day.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.counters = AnalysisCounters::fresh(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn input(total_chars: usize) -> TickInput {
        TickInput {
            has_credential: true,
            has_content: true,
            total_chars,
        }
    }

    fn scheduler() -> AutoAnalysisScheduler {
        AutoAnalysisScheduler::new(AnalysisCounters::fresh(t0()))
    }

    #[test]
    fn test_char_threshold_boundary() {
        let config = AnalysisConfig::default();
        let mut s = scheduler();

        assert!(matches!(
            s.tick(t0(), input(749), &config),
            TickDecision::Waiting(_)
        ));
        assert!(matches!(
            s.tick(t0(), input(750), &config),
            TickDecision::Trigger(_)
        ));
    }

    #[test]
    fn test_time_threshold_boundary() {
        let config = AnalysisConfig::default();
        let mut s = scheduler();

        let almost = t0() + Duration::milliseconds(599_999);
        assert!(matches!(
            s.tick(almost, input(0), &config),
            TickDecision::Waiting(_)
        ));

        let exactly = t0() + Duration::milliseconds(600_000);
        assert!(matches!(
            s.tick(exactly, input(0), &config),
            TickDecision::Trigger(_)
        ));
    }

    #[test]
    fn test_preconditions_skip() {
        let config = AnalysisConfig::default();
        let mut s = scheduler();

        let no_key = TickInput {
            has_credential: false,
            ..input(5000)
        };
        assert_eq!(
            s.tick(t0(), no_key, &config),
            TickDecision::Skipped(SkipReason::NoCredential)
        );

        let empty = TickInput {
            has_content: false,
            ..input(0)
        };
        assert_eq!(
            s.tick(t0(), empty, &config),
            TickDecision::Skipped(SkipReason::NoContent)
        );
    }

    #[test]
    fn test_future_counters_are_normalized() {
        let mut s = AutoAnalysisScheduler::new(AnalysisCounters {
            last_analysis_time: t0() + Duration::hours(1),
            last_analysis_char_count: 400,
        });

        assert!(s.normalize(t0()));
        assert_eq!(s.counters(), AnalysisCounters::fresh(t0()));
    }

    #[test]
    fn test_stale_counters_are_normalized_before_comparison() {
        let config = AnalysisConfig::default();
        let mut s = AutoAnalysisScheduler::new(AnalysisCounters {
            last_analysis_time: t0() - Duration::hours(25),
            last_analysis_char_count: 0,
        });

        // A 25 hour gap would trigger on time; after the reset it must not.
        assert!(matches!(
            s.tick(t0(), input(10), &config),
            TickDecision::Waiting(_)
        ));
        assert_eq!(s.counters(), AnalysisCounters::fresh(t0()));
    }

    #[test]
    fn test_counters_exactly_24h_old_are_kept() {
        let counters = AnalysisCounters {
            last_analysis_time: t0() - Duration::hours(24),
            last_analysis_char_count: 10,
        };
        assert!(counters.is_valid_at(t0()));
    }

    #[test]
    fn test_single_flight() {
        let config = AnalysisConfig::default();
        let mut s = scheduler();

        assert!(matches!(
            s.tick(t0(), input(800), &config),
            TickDecision::Trigger(_)
        ));
        assert!(s.begin());
        assert!(!s.begin());
        assert_eq!(s.tick(t0(), input(900), &config), TickDecision::InFlight);

        s.complete(t0() + Duration::seconds(5), 800);
        assert!(!s.is_in_flight());
        assert!(matches!(
            s.tick(t0() + Duration::seconds(30), input(900), &config),
            TickDecision::Waiting(_)
        ));
    }

    #[test]
    fn test_failure_keeps_counters() {
        let mut s = scheduler();
        let before = s.counters();
        s.begin();
        s.abandon();
        assert_eq!(s.counters(), before);
        assert!(!s.is_in_flight());
    }

    #[test]
    fn test_progress_is_pure() {
        let config = AnalysisConfig::default();
        let s = AutoAnalysisScheduler::new(AnalysisCounters {
            last_analysis_time: t0() + Duration::hours(2),
            last_analysis_char_count: 100,
        });

        // Future counters are evaluated as fresh ones at `now`.
        let progress = s.progress(t0() + Duration::seconds(100), 400, &config);
        assert_eq!(progress.new_chars, 400);
        assert_eq!(progress.chars_until_next, 350);
        assert_eq!(progress.time_until_next, Duration::seconds(600));
        assert!(!progress.ready);
        assert_eq!(s.counters().last_analysis_char_count, 100);
    }

    #[test]
    fn test_negative_new_chars() {
        let config = AnalysisConfig::default();
        let s = AutoAnalysisScheduler::new(AnalysisCounters {
            last_analysis_time: t0(),
            last_analysis_char_count: 1000,
        });
        let progress = s.progress(t0(), 200, &config);
        assert_eq!(progress.new_chars, -800);
        assert_eq!(progress.chars_until_next, 1550);
        assert!(!progress.ready);
    }

    #[test]
    fn test_config_load_defaults_and_invalid_values() {
        let blobs = MemoryBlobStore::new();
        assert_eq!(AnalysisConfig::load(&blobs), AnalysisConfig::default());

        blobs.set(KEY_AUTO_ANALYSIS_CHARS, "abc").unwrap();
        blobs.set(KEY_AUTO_ANALYSIS_TIME, "0").unwrap();
        assert_eq!(AnalysisConfig::load(&blobs), AnalysisConfig::default());

        blobs.set(KEY_AUTO_ANALYSIS_CHARS, "1500").unwrap();
        blobs.set(KEY_AUTO_ANALYSIS_TIME, "120").unwrap();
        let config = AnalysisConfig::load(&blobs);
        assert_eq!(config.char_threshold, 1500);
        assert_eq!(config.time_threshold, Duration::seconds(120));
    }

    #[test]
    fn test_config_load_out_of_range_time_uses_default() {
        let blobs = MemoryBlobStore::new();
        blobs.set(KEY_AUTO_ANALYSIS_CHARS, "900").unwrap();
        blobs.set(KEY_AUTO_ANALYSIS_TIME, "99999999999999999").unwrap();

        let config = AnalysisConfig::load(&blobs);
        assert_eq!(config.char_threshold, 900);
        assert_eq!(
            config.time_threshold,
            Duration::seconds(DEFAULT_TIME_THRESHOLD_SECS)
        );
    }

    #[test]
    fn test_config_save_rejects_zero() {
        let blobs = MemoryBlobStore::new();
        let config = AnalysisConfig {
            char_threshold: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.save(&blobs), Err(AppError::Config(_))));
    }

    #[test]
    fn test_counters_persist_and_normalize_on_load() {
        let blobs = MemoryBlobStore::new();
        let mut s = scheduler();
        s.complete(t0(), 321);
        s.persist(&blobs).unwrap();

        let restored = AutoAnalysisScheduler::load(&blobs, t0() + Duration::minutes(5));
        assert_eq!(restored.counters().last_analysis_char_count, 321);

        let expired = AutoAnalysisScheduler::load(&blobs, t0() + Duration::days(2));
        assert_eq!(
            expired.counters(),
            AnalysisCounters::fresh(t0() + Duration::days(2))
        );

        blobs.set(KEY_ANALYSIS_COUNTERS, "garbage").unwrap();
        let corrupt = AutoAnalysisScheduler::load(&blobs, t0());
        assert_eq!(corrupt.counters(), AnalysisCounters::fresh(t0()));
    }
}
