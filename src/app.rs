//! The application context.
//!
//! [`AppContext`] owns everything a running daybook needs: the blob store, the
//! entry store, user settings, the auto-analysis scheduler, the day tracker and
//! the current entry. Every operation takes the current time as an argument so
//! the same code paths run under the wall clock and under a manual test clock.
//!
//! Analysis is split in three steps so the network call can run elsewhere:
//! [`AppContext::prepare_analysis`] snapshots the current entry and marks an
//! analysis in flight, [`AnalysisEngine::analyze`] runs anywhere, and
//! [`AppContext::apply_analysis`] writes the result into the entry for the
//! snapshot's date.

use crate::ai::{CompletionBackend, OpenAiClient};
use crate::analysis::{AnalysisEngine, AnalysisOutcome, AnalysisRequest};
use crate::config::{Config, Settings};
use crate::errors::{AnalysisError, AppError, AppResult};
use crate::journal::{Entry, EntryStore};
use crate::rollover::{DayRollover, Rollover};
use crate::scheduler::{
    AnalysisConfig, AutoAnalysisScheduler, Progress, SkipReason, TickDecision, TickInput,
};
use crate::storage::BlobStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text of the transient indicator shown while an analysis runs.
pub const ANALYZING_INDICATOR: &str = "Analyzing your entry...";

/// Result of a periodic analysis check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub decision: TickDecision,
    /// Snapshot to analyze when the tick triggered.
    pub request: Option<AnalysisRequest>,
}

/// Result of a detected day change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverReport {
    pub rollover: Rollover,
    /// Final analysis of the previous day's entry, if it had text but no summary.
    pub final_request: Option<AnalysisRequest>,
}

/// Everything a running daybook owns.
pub struct AppContext {
    config: Config,
    blobs: Arc<dyn BlobStore>,
    store: EntryStore,
    settings: Settings,
    scheduler: AutoAnalysisScheduler,
    day: DayRollover,
    current: Entry,
    unsaved: bool,
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl AppContext {
    /// Loads settings, entries and counters, and opens today's entry.
    pub fn open(config: Config, blobs: Arc<dyn BlobStore>, now: DateTime<Utc>) -> Self {
        let settings = Settings::load(blobs.as_ref());
        let store = EntryStore::load(blobs.clone());
        let scheduler = AutoAnalysisScheduler::load(blobs.as_ref(), now);
        let day = DayRollover::new(now);
        let current = store.get(day.current_key(), now);

        debug!(
            "Opened context for {} ({} stored entries, key configured: {})",
            day.current_key(),
            store.len(),
            settings.has_api_key()
        );

        Self {
            config,
            blobs,
            store,
            settings,
            scheduler,
            day,
            current,
            unsaved: false,
            backend: None,
        }
    }

    /// Replaces the HTTP client with another completion backend.
    ///
    /// The backend is still only used while an API key is configured.
    pub fn with_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> (&mut Settings, &dyn BlobStore) {
        (&mut self.settings, self.blobs.as_ref())
    }

    pub fn scheduler(&self) -> &AutoAnalysisScheduler {
        &self.scheduler
    }

    pub fn current(&self) -> &Entry {
        &self.current
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// The engine for the configured credential.
    pub fn engine(&self) -> AnalysisEngine {
        AnalysisEngine::new(self.completion_backend())
    }

    /// The completion backend, if a key is configured.
    pub fn completion_backend(&self) -> Option<Arc<dyn CompletionBackend>> {
        let key = self.settings.api_key()?;
        let backend: Arc<dyn CompletionBackend> = match &self.backend {
            Some(backend) => backend.clone(),
            None => Arc::new(OpenAiClient::new(
                self.config.api_base.clone(),
                key,
                self.config.model.clone(),
            )),
        };
        Some(backend)
    }

    /// Appends user text to the current entry. Returns false for blank input.
    pub fn append_message(&mut self, text: &str, now: DateTime<Utc>) -> bool {
        let added = self.current.append_user_message(text, now);
        if added {
            self.unsaved = true;
        }
        added
    }

    /// Shows the transient analyzing indicator on the current entry.
    pub fn show_analyzing(&mut self, now: DateTime<Utc>) {
        self.current.strip_system_messages();
        self.current.push_system_message(ANALYZING_INDICATOR, now);
    }

    /// Removes transient indicators from the current entry.
    pub fn clear_indicators(&mut self) {
        self.current.strip_system_messages();
    }

    /// Persists the current entry if it has user messages.
    pub fn save(&mut self, now: DateTime<Utc>) -> bool {
        self.unsaved = false;
        if !self.current.has_messages() {
            return false;
        }
        self.current.touch(now);
        self.store.put(&self.current, now)
    }

    /// Saves only if something changed since the last save.
    pub fn save_sweep(&mut self, now: DateTime<Utc>) -> bool {
        if !self.unsaved {
            return false;
        }
        debug!("Saving unsaved changes");
        self.save(now)
    }

    /// Display-only progress toward the next automatic analysis.
    pub fn progress(&self, now: DateTime<Utc>) -> Progress {
        self.scheduler
            .progress(now, self.current.total_user_chars(), &self.settings.analysis)
    }

    /// Runs the periodic analysis check.
    ///
    /// Thresholds are re-read from the blob store on every call. When the
    /// check triggers, the current entry is snapshotted and marked in flight.
    pub fn analysis_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        self.settings.analysis = AnalysisConfig::load(self.blobs.as_ref());

        let input = TickInput {
            has_credential: self.settings.has_api_key(),
            has_content: self.current.has_messages(),
            total_chars: self.current.total_user_chars(),
        };
        let decision = self.scheduler.tick(now, input, &self.settings.analysis);
        self.persist_counters();

        let request = match decision {
            TickDecision::Trigger(_) => match self.prepare_analysis(now) {
                Ok(request) => request,
                Err(e) => {
                    debug!("Triggered analysis not started: {}", e);
                    None
                }
            },
            _ => None,
        };

        TickOutcome { decision, request }
    }

    /// Snapshots the current entry for analysis and marks an analysis in flight.
    ///
    /// Returns `Ok(None)` if another analysis is still running.
    ///
    /// # Errors
    ///
    /// `NoCredential` without an API key, `NoContent` without user messages.
    pub fn prepare_analysis(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<AnalysisRequest>, AnalysisError> {
        if !self.settings.has_api_key() {
            return Err(AnalysisError::NoCredential);
        }
        let request = AnalysisRequest::from_entry(&self.current, now)?;
        if !self.scheduler.begin() {
            return Ok(None);
        }
        Ok(Some(request))
    }

    /// Writes an analysis result back and clears the in-flight flag.
    ///
    /// A result for the current day updates the current entry and resets the
    /// counters to the snapshot's character total. A result for another day
    /// updates that day's stored entry and leaves the counters alone. On error
    /// nothing is modified and the counters are kept for a retry.
    pub fn apply_analysis(
        &mut self,
        request: &AnalysisRequest,
        result: Result<AnalysisOutcome, AnalysisError>,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.clear_indicators();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.scheduler.abandon();
                if e.is_benign() {
                    debug!("Analysis of {} skipped: {}", request.date, e);
                } else {
                    warn!("Analysis of {} failed: {}", request.date, e);
                }
                return Err(e);
            }
        };

        if request.date == self.current.date() {
            self.current.apply_analysis(&outcome.analysis, now);
            self.save(now);
            self.scheduler.complete(now, request.total_chars);
        } else {
            let mut entry = self.store.get(&request.date, now);
            if entry.has_messages() {
                entry.apply_analysis(&outcome.analysis, now);
                self.store.put(&entry, now);
                info!("Applied late analysis to {}", request.date);
            }
            self.scheduler.abandon();
        }
        self.persist_counters();

        Ok(outcome)
    }

    /// Runs an analysis of the current entry synchronously, ignoring thresholds.
    ///
    /// # Errors
    ///
    /// `NoCredential` or `NoContent` before any call. `AnalysisFailed` if the
    /// result is invalid or another analysis is still in flight.
    pub fn run_analysis(&mut self, now: DateTime<Utc>) -> Result<AnalysisOutcome, AnalysisError> {
        let request = self.prepare_analysis(now)?.ok_or_else(|| {
            AnalysisError::AnalysisFailed("another analysis is still running".to_string())
        })?;
        let result = self.engine().analyze(&request);
        self.apply_analysis(&request, result, now)
    }

    /// Moves to a new day if the calendar date changed.
    ///
    /// The outgoing entry is saved; if it has text but no summary and no
    /// analysis is running, a final analysis request for it is returned. A
    /// fresh entry is opened for the new day and the counters restart at zero.
    pub fn check_rollover(&mut self, now: DateTime<Utc>) -> Option<RolloverReport> {
        let rollover = self.day.check(now)?;
        info!(
            "Day changed from {} to {}",
            rollover.previous, rollover.current
        );

        self.save(now);

        let needs_final = self.current.has_messages()
            && !self.current.has_summary()
            && self.settings.has_api_key();
        let final_request = if needs_final && self.scheduler.begin() {
            match AnalysisRequest::from_entry(&self.current, now) {
                Ok(request) => Some(request),
                Err(_) => {
                    self.scheduler.abandon();
                    None
                }
            }
        } else {
            None
        };

        self.current = self.store.get(&rollover.current, now);
        self.unsaved = false;
        self.scheduler.reset(now);
        self.persist_counters();

        Some(RolloverReport {
            rollover,
            final_request,
        })
    }

    /// Deletes every entry and restarts the counters. Diagnostic mode only.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` outside diagnostic mode, or the storage error.
    pub fn clear_all(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if !self.settings.test_mode {
            return Err(AppError::Config(
                "Clearing all entries requires test mode (daybook settings --test-mode true)"
                    .to_string(),
            ));
        }
        self.store.clear()?;
        self.current = Entry::new(self.day.current_key(), now);
        self.unsaved = false;
        self.scheduler.reset(now);
        self.scheduler.persist(self.blobs.as_ref())?;
        Ok(())
    }

    /// Saves the current entry and counters before exit.
    pub fn shutdown(&mut self, now: DateTime<Utc>) {
        self.clear_indicators();
        self.save(now);
        self.persist_counters();
        debug!("Context shut down");
    }

    /// Why an analysis tick would be skipped right now, if it would.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if !self.settings.has_api_key() {
            Some(SkipReason::NoCredential)
        } else if !self.current.has_messages() {
            Some(SkipReason::NoContent)
        } else {
            None
        }
    }

    fn persist_counters(&self) {
        if let Err(e) = self.scheduler.persist(self.blobs.as_ref()) {
            warn!("Failed to persist analysis counters: {}", e);
        }
    }
}
