//! Deterministic keyword analyzer used when the remote model is unavailable.
//!
//! Emotions are scored by counting case-insensitive keyword occurrences and
//! ranked by score, ties keeping table order. Themes are detected by presence
//! of any pattern, in table order. Both lists are capped at four and fall back
//! to a default tag when nothing matches, so the result is never empty and
//! only ever contains vocabulary tags.

use crate::analysis::vocabulary::{DEFAULT_EMOTION, DEFAULT_THEME};
use crate::analysis::Analysis;
use crate::constants::MAX_TAGS;

/// Emotion tag and the keywords that score it.
const EMOTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("in love", &["in love", "love you", "i love"]),
    ("romantic", &["romantic", "darling", "tender"]),
    ("affectionate", &["affection", "sweet", "cuddle"]),
    ("anxious", &["anxious", "anxiety", "nervous"]),
    ("worried", &["worried", "worry", "afraid"]),
    ("overwhelmed", &["overwhelm", "swamped", "too much"]),
    ("sad", &["sad", "crying", "tears"]),
    ("devastated", &["devastated", "destroyed", "heartbroken"]),
    ("depressed", &["depressed", "want to die", "hopeless"]),
    ("confused", &["confused", "don't know what", "lost"]),
    ("stuck", &["stuck", "blocked", "can't move"]),
    ("indecisive", &["indecisive", "not sure if", "doubts"]),
    ("frustrated", &["frustrated", "frustration", "why me"]),
    ("annoyed", &["annoyed", "irritated", "bothered"]),
    ("furious", &["furious", "angry", "rage"]),
    ("vulnerable", &["vulnerable", "fragile", "sensitive"]),
    ("exposed", &["exposed", "defenseless", "unprotected"]),
    ("happy", &["happy", "glad", "joy"]),
    ("hopeful", &["hopeful", "hoping", "i hope", "wish", "looking forward"]),
    ("motivated", &["motivated", "eager", "energy"]),
    ("nostalgic", &["nostalgic", "remember", "used to"]),
    ("reflective", &["reflect", "i think", "ponder"]),
    ("bored", &["bored", "nothing to do", "boring"]),
];

/// Theme tag and the patterns that detect it.
const THEME_PATTERNS: &[(&str, &[&str])] = &[
    (
        "relationships",
        &["girlfriend", "boyfriend", "partner", "love", "relationship"],
    ),
    ("family", &["family", "mom", "dad", "brother", "sister"]),
    ("work", &["work", "office", "meeting", "boss"]),
    ("health", &["sleep", "doctor", "sick", "exercise"]),
    ("travel", &["trip", "travel", "hours each way", "flight"]),
    ("conflicts", &["for nothing", "why me", "argument", "fight"]),
    ("communication", &["talked", "told me", "asked", "message"]),
    ("time", &["yesterday", "tomorrow", "today", "when"]),
    ("plans", &["plan", "see you", "what to do"]),
];

/// Analyzes `text` with the keyword tables.
///
/// The result depends only on `text`, so repeated runs over the same input
/// produce identical analyses.
///
/// # Examples
///
/// ```
/// use daybook::analysis::fallback::analyze;
///
/// let analysis = analyze("So happy today, the meeting at work went well");
/// assert_eq!(analysis.emotions, ["happy"]);
/// assert_eq!(analysis.themes, ["work", "time"]);
/// assert_eq!(analysis.title, "Happy day");
/// ```
pub fn analyze(text: &str) -> Analysis {
    let lowered = text.to_lowercase();
    let emotions = detect_emotions(&lowered);
    let themes = detect_themes(&lowered);

    Analysis {
        title: title_for(&emotions, &themes),
        summary: summary_for(&emotions, &themes),
        emotions,
        themes,
    }
}

/// Emotion tags ranked by keyword score, at most four.
pub fn detect_emotions(lowered: &str) -> Vec<String> {
    let mut scored: Vec<(&str, usize)> = EMOTION_KEYWORDS
        .iter()
        .map(|(tag, keywords)| {
            let score = keywords.iter().map(|k| lowered.matches(k).count()).sum();
            (*tag, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    // Stable sort keeps table order among equal scores.
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let mut emotions: Vec<String> = scored
        .into_iter()
        .take(MAX_TAGS)
        .map(|(tag, _)| tag.to_string())
        .collect();
    if emotions.is_empty() {
        emotions.push(DEFAULT_EMOTION.to_string());
    }
    emotions
}

/// Theme tags whose patterns occur in the text, in table order, at most four.
pub fn detect_themes(lowered: &str) -> Vec<String> {
    let mut themes: Vec<String> = THEME_PATTERNS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p)))
        .take(MAX_TAGS)
        .map(|(tag, _)| tag.to_string())
        .collect();
    if themes.is_empty() {
        themes.push(DEFAULT_THEME.to_string());
    }
    themes
}

fn has(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

fn title_for(emotions: &[String], themes: &[String]) -> String {
    if has(emotions, "depressed") {
        return "Emotional crisis".to_string();
    }
    if has(emotions, "devastated") && has(emotions, "anxious") {
        return "Anxious devastation".to_string();
    }
    if has(emotions, "frustrated") && has(themes, "relationships") {
        return "Frustrated love".to_string();
    }
    if has(emotions, "in love") && has(emotions, "anxious") {
        return "Anxious love".to_string();
    }

    let dominant = emotions
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_EMOTION);
    format!("{} day", capitalize(dominant))
}

fn summary_for(emotions: &[String], themes: &[String]) -> String {
    let feelings = first_two(emotions);
    let topics = first_two(themes);

    if has(emotions, "depressed") {
        return format!(
            "A critical emotional state marked by {}. Thoughts around {} weigh heavily and lead to overthinking. Reaching out to someone you trust could help.",
            feelings, topics
        );
    }
    if has(emotions, "devastated") && has(themes, "relationships") {
        return format!(
            "An emotional crisis centered on the relationship. Intense feelings of {} dominate the day. Events related to {} deepen the emotional weight.",
            feelings, topics
        );
    }
    format!(
        "An emotionally rich day with {}. The themes of {} call for some inner processing.",
        feelings, topics
    )
}

fn first_two(tags: &[String]) -> String {
    tags.iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" and ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
