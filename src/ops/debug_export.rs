//! Diagnostic snapshot export.
//!
//! Dumps the current state, every stored entry, the settings (with the API
//! key masked) and the analysis counters into a single JSON document.

use crate::app::AppContext;
use crate::constants::{DATE_FORMAT_ISO, DEBUG_EXPORT_PREFIX};
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the diagnostic document for `ctx` as of `now`.
pub fn debug_snapshot(ctx: &AppContext, now: DateTime<Utc>) -> AppResult<Value> {
    let settings = ctx.settings();
    let counters = ctx.scheduler().counters();
    let progress = ctx.progress(now);

    let mut all_entries = Map::new();
    for entry in ctx.store().entries() {
        all_entries.insert(entry.date().to_string(), serde_json::to_value(entry)?);
    }

    Ok(json!({
        "timestamp": now.to_rfc3339(),
        "currentState": {
            "currentDate": ctx.current().date(),
            "currentEntry": serde_json::to_value(ctx.current())?,
        },
        "allEntries": Value::Object(all_entries),
        "config": {
            "apiKey": settings.masked_api_key(),
            "autoAnalysisChars": settings.analysis.char_threshold,
            "autoAnalysisTime": settings.analysis.time_threshold.num_seconds(),
            "testMode": settings.test_mode,
        },
        "analysisCounters": {
            "totalCharacters": ctx.current().total_user_chars(),
            "lastAnalysisCharCount": counters.last_analysis_char_count,
            "newCharsSinceLastAnalysis": progress.new_chars,
            "lastAnalysisTime": counters.last_analysis_time.to_rfc3339(),
            "timeSinceLastAnalysis": progress.elapsed.num_seconds(),
            "autoAnalysisChars": settings.analysis.char_threshold,
            "autoAnalysisTime": settings.analysis.time_threshold.num_seconds(),
            "shouldAnalyzeByChars": progress.new_chars >= settings.analysis.char_threshold as i64,
            "shouldAnalyzeByTime": progress.elapsed >= settings.analysis.time_threshold,
        },
    }))
}

/// File name of the export for `now`'s date.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("{}{}.json", DEBUG_EXPORT_PREFIX, now.format(DATE_FORMAT_ISO))
}

/// Writes the diagnostic document into `dir` and returns the file path.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn export_debug(ctx: &AppContext, dir: &Path, now: DateTime<Utc>) -> AppResult<PathBuf> {
    let document = debug_snapshot(ctx, now)?;
    let path = dir.join(export_file_name(now));
    fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    info!("Debug export written to {:?}", path);
    Ok(path)
}
