//! The closed tag vocabularies.
//!
//! Entries may only carry emotion and theme tags from these lists. Each list is
//! grouped into families of four related tags; the grouping is used by the
//! analysis prompt and by insight reports.

/// Emotion tags, in families of four.
pub const EMOTION_GROUPS: [[&str; 4]; 12] = [
    ["in love", "romantic", "affectionate", "tender"],
    ["anxious", "nervous", "worried", "overwhelmed"],
    ["sad", "melancholic", "depressed", "devastated"],
    ["happy", "cheerful", "content", "radiant"],
    ["confused", "lost", "indecisive", "stuck"],
    ["frustrated", "annoyed", "angry", "furious"],
    ["hopeful", "optimistic", "excited", "motivated"],
    ["bored", "empty", "apathetic", "listless"],
    ["calm", "relaxed", "serene", "at peace"],
    ["productive", "focused", "active", "efficient"],
    ["vulnerable", "sensitive", "fragile", "exposed"],
    ["nostalgic", "reflective", "thoughtful", "contemplative"],
];

/// Theme tags, in families of four.
pub const THEME_GROUPS: [[&str; 4]; 12] = [
    ["relationships", "partner", "family", "friendship"],
    ["work", "studies", "projects", "career"],
    ["health", "wellbeing", "self-care", "body"],
    ["time", "routine", "plans", "organization"],
    ["money", "economy", "expenses", "future"],
    ["creativity", "art", "music", "expression"],
    ["loneliness", "isolation", "connection", "social"],
    ["decisions", "changes", "transitions", "growth"],
    ["conflicts", "problems", "obstacles", "challenges"],
    ["achievements", "successes", "goals", "progress"],
    ["travel", "places", "experiences", "adventures"],
    ["technology", "digital", "networks", "communication"],
];

/// Emotion used when no emotion keyword is detected.
pub const DEFAULT_EMOTION: &str = "reflective";
/// Theme used when no theme keyword is detected.
pub const DEFAULT_THEME: &str = "experiences";

/// Iterates over every emotion tag in vocabulary order.
pub fn emotions() -> impl Iterator<Item = &'static str> {
    EMOTION_GROUPS.iter().flatten().copied()
}

/// Iterates over every theme tag in vocabulary order.
pub fn themes() -> impl Iterator<Item = &'static str> {
    THEME_GROUPS.iter().flatten().copied()
}

/// Maps a free-form tag onto the emotion vocabulary, ignoring case and
/// surrounding whitespace.
///
/// # Examples
///
/// ```
/// use daybook::analysis::vocabulary::canonical_emotion;
///
/// assert_eq!(canonical_emotion(" Anxious "), Some("anxious"));
/// assert_eq!(canonical_emotion("ecstatic"), None);
/// ```
pub fn canonical_emotion(tag: &str) -> Option<&'static str> {
    canonical(emotions(), tag)
}

/// Maps a free-form tag onto the theme vocabulary, ignoring case and
/// surrounding whitespace.
pub fn canonical_theme(tag: &str) -> Option<&'static str> {
    canonical(themes(), tag)
}

pub fn is_emotion(tag: &str) -> bool {
    emotions().any(|e| e == tag)
}

pub fn is_theme(tag: &str) -> bool {
    themes().any(|t| t == tag)
}

fn canonical(
    mut vocabulary: impl Iterator<Item = &'static str>,
    tag: &str,
) -> Option<&'static str> {
    let wanted = tag.trim().to_lowercase();
    vocabulary.find(|candidate| *candidate == wanted)
}

/// Prompt-ready listing of a vocabulary, one family per line.
pub fn describe(groups: &[[&str; 4]]) -> String {
    groups
        .iter()
        .map(|group| format!("- {}", group.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
