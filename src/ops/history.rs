//! Text rendering of past entries for the `history` and `show` commands.

use crate::journal::Entry;

/// Characters of entry text shown in a history line.
const PREVIEW_CHARS: usize = 80;

/// One-line summary of an entry: date, title, tags and a short preview.
pub fn history_line(entry: &Entry) -> String {
    let title = if entry.title().is_empty() {
        "Untitled"
    } else {
        entry.title()
    };

    let mut line = format!("{}  {}", entry.date(), title);
    if !entry.emotions().is_empty() {
        line.push_str(&format!("  [{}]", entry.emotions().join(", ")));
    }

    let preview_source = if entry.has_summary() {
        entry.summary().to_string()
    } else {
        entry
            .user_messages()
            .next()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    };
    let preview = preview(&preview_source);
    if !preview.is_empty() {
        line.push_str("\n    ");
        line.push_str(&preview);
    }
    line
}

/// Collapses whitespace and truncates to the preview length.
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Full rendering of an entry with its analysis and every user message.
pub fn render_entry(entry: &Entry) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}", entry.date()));
    if !entry.title().is_empty() {
        out.push_str(&format!(" - {}", entry.title()));
    }
    out.push('\n');

    if entry.has_summary() {
        out.push_str(&format!("\n{}\n", entry.summary()));
    }
    if !entry.emotions().is_empty() {
        out.push_str(&format!("\nEmotions: {}", entry.emotions().join(", ")));
    }
    if !entry.themes().is_empty() {
        out.push_str(&format!("\nThemes:   {}", entry.themes().join(", ")));
    }
    if !entry.emotions().is_empty() || !entry.themes().is_empty() {
        out.push('\n');
    }

    for message in entry.user_messages() {
        out.push_str(&format!(
            "\n[{}] {}\n",
            message.timestamp.format("%H:%M"),
            message.content
        ));
    }
    out
}
