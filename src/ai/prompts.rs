//! Prompt builders for entry analysis and suggestions.

use crate::analysis::vocabulary::{describe, EMOTION_GROUPS, THEME_GROUPS};

/// Builds the analysis prompt for the given entry text.
///
/// The prompt constrains tags to the two vocabularies and asks for a single
/// JSON object with `title`, `summary`, `emotions` and `themes`.
pub fn analysis_prompt(entry_text: &str) -> String {
    format!(
        r#"Analyze this personal journal entry and extract its specific content.

ENTRY:
---
{entry}
---

ALLOWED EMOTION TAGS (use only these):
{emotions}

ALLOWED THEME TAGS (use only these):
{themes}

Instructions:
1. Title: at most 4 words, specific to what happened
2. Summary: 2-3 sentences naming concrete events, people and feelings
3. Emotions: up to 4 tags from the allowed emotion list, most intense first
4. Themes: up to 4 tags from the allowed theme list, most relevant first
5. Never invent tags outside the lists

Respond ONLY with valid JSON in this shape:
{{
  "title": "specific title",
  "summary": "detailed summary with concrete events",
  "emotions": ["tag1", "tag2"],
  "themes": ["theme1", "theme2"]
}}"#,
        entry = entry_text,
        emotions = describe(&EMOTION_GROUPS),
        themes = describe(&THEME_GROUPS),
    )
}

/// Builds the suggestion prompt from the last week's tags and summaries.
pub fn suggestion_prompt(emotions: &[String], themes: &[String], summaries: &[String]) -> String {
    let or_none = |items: &[String]| {
        if items.is_empty() {
            "none recorded".to_string()
        } else {
            items.join(", ")
        }
    };

    let summaries = if summaries.is_empty() {
        "none recorded".to_string()
    } else {
        summaries
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are a warm, practical wellbeing coach. Based on this person's journal from the last 7 days, suggest 3 concrete, kind actions for today.

RECENT EMOTIONS: {emotions}
RECURRING THEMES: {themes}

RECENT SUMMARIES:
{summaries}

Respond ONLY with a JSON array of exactly 3 objects:
[
  {{"icon": "single emoji", "text": "one short, specific suggestion"}}
]"#,
        emotions = or_none(emotions),
        themes = or_none(themes),
        summaries = summaries,
    )
}
