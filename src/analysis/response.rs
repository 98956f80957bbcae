//! Cleanup of raw model output before JSON parsing.
//!
//! Chat models often wrap JSON in markdown fences or surround it with prose.
//! These helpers strip a leading fence and keep the outermost bracketed span.

/// Extracts a JSON object from raw model output.
///
/// Trims the text, strips a leading ```` ```json ```` or ```` ``` ```` fence with
/// its closing fence, then keeps the span from the first `{` to the last `}`
/// if one exists.
///
/// # Examples
///
/// ```
/// use daybook::analysis::response::clean_json_response;
///
/// let raw = "```json\n{\"title\": \"Calm day\"}\n```";
/// assert_eq!(clean_json_response(raw), "{\"title\": \"Calm day\"}");
///
/// let chatty = "Here you go: {\"a\": 1} hope it helps";
/// assert_eq!(clean_json_response(chatty), "{\"a\": 1}");
/// ```
pub fn clean_json_response(content: &str) -> String {
    extract_span(&strip_fence(content), '{', '}')
}

/// Extracts a JSON array from raw model output, like [`clean_json_response`]
/// but keeping the span from the first `[` to the last `]`.
pub fn clean_json_array_response(content: &str) -> String {
    extract_span(&strip_fence(content), '[', ']')
}

fn strip_fence(content: &str) -> String {
    let cleaned = content.trim();
    let body = if let Some(rest) = cleaned.strip_prefix("```json") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        rest
    } else {
        return cleaned.to_string();
    };

    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim_end().to_string()
}

fn extract_span(text: &str, open: char, close: char) -> String {
    match (text.find(open), text.rfind(close)) {
        (Some(start), Some(end)) if start < end => text[start..=end].trim().to_string(),
        _ => text.trim().to_string(),
    }
}
