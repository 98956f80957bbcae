//! The journal entry for one calendar day.
//!
//! An [`Entry`] holds the user's messages for a day together with the fields
//! derived by analysis (title, summary, emotion and theme tags). Messages are
//! append-only; the derived fields are overwritten as a unit by
//! [`Entry::apply_analysis`], so a late analysis result never touches messages.

use crate::analysis::Analysis;
use crate::constants::MAX_TAGS;
use crate::journal::parse_date;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Text written by the user. Counted for analysis and persisted.
    User,
    /// Transient UI artifact such as a typing indicator. Never persisted.
    System,
}

/// A single message in an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::User,
            timestamp,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::System,
            timestamp,
        }
    }

    /// Returns true for user-authored messages.
    pub fn is_user(&self) -> bool {
        self.kind == MessageKind::User
    }
}

/// One day of journaling.
///
/// Serialized with camelCase field names so the stored mapping matches
/// `{id, date, title, messages, summary, emotions, themes, createdAt, updatedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    id: String,
    date: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    emotions: Vec<String>,
    #[serde(default)]
    themes: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Entry {
    /// Creates an empty entry keyed by `date_key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use daybook::journal::Entry;
    ///
    /// let entry = Entry::new("2024-01-15", Utc::now());
    /// assert_eq!(entry.id(), "2024-01-15");
    /// assert!(!entry.has_messages());
    /// ```
    pub fn new(date_key: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: date_key.to_string(),
            date: date_key.to_string(),
            title: String::new(),
            messages: Vec::new(),
            summary: String::new(),
            emotions: Vec::new(),
            themes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Parsed calendar date, if the key is well formed.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date).ok()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn emotions(&self) -> &[String] {
        &self.emotions
    }

    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Appends a user message. Blank input is ignored.
    ///
    /// Returns true if a message was added.
    pub fn append_user_message(&mut self, content: &str, now: DateTime<Utc>) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }
        self.messages.push(Message::user(content, now));
        true
    }

    /// Appends a transient system message.
    pub fn push_system_message(&mut self, content: &str, now: DateTime<Utc>) {
        self.messages.push(Message::system(content, now));
    }

    /// Drops every system message.
    pub fn strip_system_messages(&mut self) {
        self.messages.retain(Message::is_user);
    }

    /// Iterates over user messages in order.
    pub fn user_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_user())
    }

    pub fn user_message_count(&self) -> usize {
        self.user_messages().count()
    }

    /// True when the entry holds at least one user message.
    pub fn has_messages(&self) -> bool {
        self.user_messages().next().is_some()
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    /// Total length of all user messages, in characters.
    pub fn total_user_chars(&self) -> usize {
        self.user_messages().map(|m| m.content.chars().count()).sum()
    }

    /// Number of whitespace-separated words across user messages.
    pub fn word_count(&self) -> usize {
        self.user_messages()
            .map(|m| m.content.split_whitespace().count())
            .sum()
    }

    /// User message contents joined by a blank line, in order.
    pub fn analysis_input(&self) -> String {
        self.user_messages()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Writes the derived fields and bumps `updated_at`.
    ///
    /// Tags are deduplicated and capped at four each. Messages are untouched.
    pub fn apply_analysis(&mut self, analysis: &Analysis, now: DateTime<Utc>) {
        self.title = analysis.title.clone();
        self.summary = analysis.summary.clone();
        self.emotions = dedup_capped(&analysis.emotions);
        self.themes = dedup_capped(&analysis.themes);
        self.updated_at = now;
    }

    /// Bumps `updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Case-insensitive match against title, summary, tags and message contents.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let haystack = [self.title.as_str(), self.summary.as_str()]
            .into_iter()
            .chain(self.emotions.iter().map(String::as_str))
            .chain(self.themes.iter().map(String::as_str))
            .chain(self.messages.iter().map(|m| m.content.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        haystack.contains(&needle)
    }
}

fn dedup_capped(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for tag in tags {
        if out.len() == MAX_TAGS {
            break;
        }
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}
