//! The analysis pipeline: remote completion, cleanup, sanitization, fallback.
//!
//! [`AnalysisEngine::analyze`] never surfaces remote failures. A network error,
//! a non-success status or an unparseable payload is logged and answered by the
//! keyword fallback instead. Remote tags are mapped onto the vocabulary; tags
//! that do not map are dropped, and a list left empty is filled from the
//! fallback so every applied analysis satisfies [`Analysis::validate`].

use crate::ai::{analysis_prompt, CompletionBackend};
use crate::analysis::response::clean_json_response;
use crate::analysis::vocabulary::{canonical_emotion, canonical_theme};
use crate::analysis::{fallback, Analysis};
use crate::constants::{ANALYSIS_MAX_TOKENS, MAX_TAGS};
use crate::errors::AnalysisError;
use crate::journal::{parse_date, Entry};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot of an entry taken when an analysis is requested.
///
/// The snapshot travels to the worker; the result is later written back into
/// whichever entry carries `date`, so input typed meanwhile is never lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub date: String,
    pub text: String,
    pub total_chars: usize,
    pub requested_at: DateTime<Utc>,
}

impl AnalysisRequest {
    /// Captures the analysis input of `entry`.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NoContent` if the entry has no user messages.
    pub fn from_entry(entry: &Entry, now: DateTime<Utc>) -> Result<Self, AnalysisError> {
        if !entry.has_messages() {
            return Err(AnalysisError::NoContent);
        }
        Ok(Self {
            date: entry.date().to_string(),
            text: entry.analysis_input(),
            total_chars: entry.total_user_chars(),
            requested_at: now,
        })
    }

    fn calendar_date(&self) -> NaiveDate {
        parse_date(&self.date).unwrap_or_else(|_| self.requested_at.date_naive())
    }
}

/// Which path produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Remote,
    Fallback,
}

/// A validated analysis and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub analysis: Analysis,
    pub source: AnalysisSource,
}

/// Runs analyses against an optional remote backend.
///
/// Without a backend every run fails with `NoCredential`.
#[derive(Clone, Default)]
pub struct AnalysisEngine {
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl AnalysisEngine {
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>) -> Self {
        Self { backend }
    }

    /// Analyzes the snapshot.
    ///
    /// # Errors
    ///
    /// - `NoCredential` when no backend is configured (checked first)
    /// - `NoContent` when the snapshot holds no text
    /// - `AnalysisFailed` when the final analysis violates its invariants
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let backend = self.backend.as_ref().ok_or(AnalysisError::NoCredential)?;
        if request.text.trim().is_empty() {
            return Err(AnalysisError::NoContent);
        }

        debug!(
            "Analyzing entry {} ({} chars)",
            request.date, request.total_chars
        );

        let outcome = match Self::remote(backend.as_ref(), request) {
            Ok(analysis) => AnalysisOutcome {
                analysis,
                source: AnalysisSource::Remote,
            },
            Err(e) => {
                warn!("Using fallback analysis for {}: {}", request.date, e);
                AnalysisOutcome {
                    analysis: fallback::analyze(&request.text),
                    source: AnalysisSource::Fallback,
                }
            }
        };

        outcome.analysis.validate()?;
        info!(
            "Analysis of {} completed via {:?}: '{}'",
            request.date, outcome.source, outcome.analysis.title
        );
        Ok(outcome)
    }

    fn remote(
        backend: &dyn CompletionBackend,
        request: &AnalysisRequest,
    ) -> Result<Analysis, AnalysisError> {
        let prompt = analysis_prompt(&request.text);
        let raw = backend
            .complete(&prompt, ANALYSIS_MAX_TOKENS)
            .map_err(|e| AnalysisError::RemoteUnavailable(e.to_string()))?;
        parse_remote_analysis(&raw, &request.text, request.calendar_date())
    }
}

/// Shape of the model's JSON answer. Missing fields default to empty.
#[derive(Debug, Default, Deserialize)]
struct RemoteAnalysis {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    emotions: Vec<String>,
    #[serde(default)]
    themes: Vec<String>,
}

/// Parses and sanitizes a raw model reply.
///
/// `text` is the analyzed input, used to fill tag lists and the summary when
/// the reply leaves them empty. An empty title becomes the default title for
/// `date`.
///
/// # Errors
///
/// Returns `AnalysisError::MalformedResponse` if the cleaned reply is not a
/// JSON object of the expected shape.
pub fn parse_remote_analysis(
    raw: &str,
    text: &str,
    date: NaiveDate,
) -> Result<Analysis, AnalysisError> {
    let cleaned = clean_json_response(raw);
    let remote: RemoteAnalysis = serde_json::from_str(&cleaned)
        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

    let mut emotions = sanitize_tags(&remote.emotions, canonical_emotion);
    let mut themes = sanitize_tags(&remote.themes, canonical_theme);
    let mut summary = remote.summary.trim().to_string();

    if emotions.is_empty() || themes.is_empty() || summary.is_empty() {
        let local = fallback::analyze(text);
        if emotions.is_empty() {
            emotions = local.emotions;
        }
        if themes.is_empty() {
            themes = local.themes;
        }
        if summary.is_empty() {
            summary = local.summary;
        }
    }

    let title = match remote.title.trim() {
        "" => default_title(date),
        title => title.to_string(),
    };

    Ok(Analysis {
        title,
        summary,
        emotions,
        themes,
    })
}

/// Maps tags onto a vocabulary, dropping unknown tags and duplicates, capped at four.
fn sanitize_tags(tags: &[String], canonical: fn(&str) -> Option<&'static str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        match canonical(tag) {
            Some(known) if !out.iter().any(|t| t == known) => out.push(known.to_string()),
            Some(_) => {}
            None => debug!("Dropping out-of-vocabulary tag '{}'", tag),
        }
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}

/// Title used when the model returns none, e.g. `Day 15 - Jan`.
pub fn default_title(date: NaiveDate) -> String {
    format!("Day {} - {}", date.day(), date.format("%b"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AIError, AppResult};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedBackend {
        reply: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl CannedBackend {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl CompletionBackend for CannedBackend {
        fn complete(&self, _prompt: &str, max_tokens: u32) -> AppResult<String> {
            assert_eq!(max_tokens, ANALYSIS_MAX_TOKENS);
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(status) => Err(AIError::HttpStatus {
                    status: *status,
                    body: String::new(),
                }
                .into()),
            }
        }
    }

    fn request(text: &str) -> AnalysisRequest {
        AnalysisRequest {
            date: "2024-01-15".to_string(),
            text: text.to_string(),
            total_chars: text.chars().count(),
            requested_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    fn jan_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_no_backend_is_no_credential() {
        let engine = AnalysisEngine::new(None);
        assert_eq!(
            engine.analyze(&request("")),
            Err(AnalysisError::NoCredential)
        );
    }

    #[test]
    fn test_empty_text_is_no_content_without_calling_backend() {
        let backend = CannedBackend::ok("{}");
        let engine = AnalysisEngine::new(Some(backend.clone()));
        assert_eq!(
            engine.analyze(&request("   ")),
            Err(AnalysisError::NoContent)
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_from_empty_entry_is_no_content() {
        let entry = Entry::new("2024-01-15", Utc::now());
        assert_eq!(
            AnalysisRequest::from_entry(&entry, Utc::now()),
            Err(AnalysisError::NoContent)
        );
    }

    #[test]
    fn test_remote_success() {
        let backend = CannedBackend::ok(
            "```json\n{\"title\": \"Beach walk\", \"summary\": \"Walked by the sea.\", \"emotions\": [\"Calm\", \"relaxed\"], \"themes\": [\"wellbeing\"]}\n```",
        );
        let engine = AnalysisEngine::new(Some(backend));
        let outcome = engine.analyze(&request("Walked by the sea")).unwrap();

        assert_eq!(outcome.source, AnalysisSource::Remote);
        assert_eq!(outcome.analysis.title, "Beach walk");
        assert_eq!(outcome.analysis.emotions, ["calm", "relaxed"]);
        assert_eq!(outcome.analysis.themes, ["wellbeing"]);
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        let backend = CannedBackend::ok("I'm sorry, I can't do that.");
        let engine = AnalysisEngine::new(Some(backend));
        let text = "So happy at work today";
        let outcome = engine.analyze(&request(text)).unwrap();

        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(outcome.analysis, fallback::analyze(text));
    }

    #[test]
    fn test_remote_failure_falls_back() {
        let engine = AnalysisEngine::new(Some(CannedBackend::failing(500)));
        let outcome = engine.analyze(&request("bored")).unwrap();
        assert_eq!(outcome.source, AnalysisSource::Fallback);
        assert_eq!(outcome.analysis.emotions, ["bored"]);
    }

    #[test]
    fn test_unknown_tags_are_dropped_and_refilled() {
        let raw = r#"{"title": "Odd", "summary": "s", "emotions": ["ecstatic", "happy", "HAPPY"], "themes": ["quantum"]}"#;
        let analysis = parse_remote_analysis(raw, "a meeting at work", jan_15()).unwrap();

        assert_eq!(analysis.emotions, ["happy"]);
        assert_eq!(analysis.themes, ["work"]);
        assert!(analysis.validate().is_ok());
    }

    #[test]
    fn test_remote_tags_capped_at_four() {
        let raw = r#"{"title": "t", "summary": "s", "emotions": ["sad", "calm", "happy", "bored", "lost"], "themes": ["work"]}"#;
        let analysis = parse_remote_analysis(raw, "", jan_15()).unwrap();
        assert_eq!(analysis.emotions, ["sad", "calm", "happy", "bored"]);
    }

    #[test]
    fn test_empty_title_uses_date_default() {
        let raw = r#"{"summary": "s", "emotions": ["calm"], "themes": ["work"]}"#;
        let analysis = parse_remote_analysis(raw, "", jan_15()).unwrap();
        assert_eq!(analysis.title, "Day 15 - Jan");
    }

    #[test]
    fn test_wrong_field_types_are_malformed() {
        let raw = r#"{"title": 3, "emotions": "calm"}"#;
        assert!(matches!(
            parse_remote_analysis(raw, "", jan_15()),
            Err(AnalysisError::MalformedResponse(_))
        ));
    }
}
