//! Personalized suggestions for today.
//!
//! Suggestions are generated remotely from the last week's tags and
//! summaries. When there is no credential, no recent writing, or the remote
//! reply is unusable, a short rule-based list is returned instead.

use crate::ai::{suggestion_prompt, CompletionBackend};
use crate::analysis::response::clean_json_array_response;
use crate::constants::SUGGESTION_MAX_TOKENS;
use crate::journal::Entry;
use crate::ops::insights::recent_entries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

const MAX_SUGGESTIONS: usize = 3;

/// A single suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub icon: String,
    pub text: String,
}

impl Suggestion {
    fn new(icon: &str, text: &str) -> Self {
        Self {
            icon: icon.to_string(),
            text: text.to_string(),
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.text)
    }
}

/// Produces suggestions for `today`.
///
/// # Arguments
///
/// * `backend` - Remote completion backend, `None` when no credential is configured
/// * `entries` - All stored entries
/// * `today` - The current calendar date
///
/// Never fails: remote errors are logged and answered with the rule-based list.
pub fn suggest<'a>(
    backend: Option<&dyn CompletionBackend>,
    entries: impl IntoIterator<Item = &'a Entry>,
    today: NaiveDate,
) -> Vec<Suggestion> {
    let Some(backend) = backend else {
        return vec![Suggestion::new(
            "🔑",
            "Configure your API key to get personalized suggestions",
        )];
    };

    let mut active: Vec<&Entry> = entries.into_iter().filter(|e| e.has_messages()).collect();
    active.sort_by(|a, b| b.date().cmp(a.date()));
    let recent = recent_entries(&active, today);
    if recent.is_empty() {
        return vec![Suggestion::new(
            "📝",
            "Write more in your journal to get personalized suggestions",
        )];
    }

    let emotions: Vec<String> = recent.iter().flat_map(|e| e.emotions()).cloned().collect();
    let themes: Vec<String> = recent.iter().flat_map(|e| e.themes()).cloned().collect();
    let summaries: Vec<String> = recent
        .iter()
        .filter(|e| e.has_summary())
        .map(|e| e.summary().to_string())
        .collect();

    let prompt = suggestion_prompt(&emotions, &themes, &summaries);
    match backend.complete(&prompt, SUGGESTION_MAX_TOKENS) {
        Ok(raw) => match parse_suggestions(&raw) {
            Some(suggestions) => {
                debug!("Received {} suggestions", suggestions.len());
                suggestions
            }
            None => {
                warn!("Suggestion reply was not a usable JSON array");
                basic_suggestions(&emotions)
            }
        },
        Err(e) => {
            warn!("Suggestion request failed: {}", e);
            basic_suggestions(&emotions)
        }
    }
}

/// Parses a remote reply into at most three suggestions.
pub fn parse_suggestions(raw: &str) -> Option<Vec<Suggestion>> {
    let cleaned = clean_json_array_response(raw);
    let parsed: Vec<Suggestion> = serde_json::from_str(&cleaned).ok()?;
    let suggestions: Vec<Suggestion> = parsed
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .take(MAX_SUGGESTIONS)
        .collect();
    (!suggestions.is_empty()).then_some(suggestions)
}

/// Rule-based suggestions keyed on recent emotions.
pub fn basic_suggestions(emotions: &[String]) -> Vec<Suggestion> {
    let has = |names: &[&str]| emotions.iter().any(|e| names.contains(&e.as_str()));
    let mut suggestions = Vec::new();

    if has(&["anxious", "nervous"]) {
        suggestions.push(Suggestion::new(
            "🫁",
            "Try five minutes of slow, deep breathing",
        ));
    }
    if has(&["sad", "depressed"]) {
        suggestions.push(Suggestion::new(
            "🚶",
            "Take a 15-minute walk outside",
        ));
    }
    if has(&["confused", "lost"]) {
        suggestions.push(Suggestion::new(
            "📋",
            "Break today into a short list of small tasks",
        ));
    }
    suggestions.push(Suggestion::new("🎉", "Celebrate small daily wins"));

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
