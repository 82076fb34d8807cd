//! Best-effort recovery of a JSON object from model output
//!
//! Models wrap their answer in markdown fences or conversational prose. The
//! recovery slices from the first `{` to the last `}`; it does not check that
//! braces balance, so text holding several objects or braces inside string
//! literals can yield an invalid slice, which then surfaces as a parse error.

use serde_json::Value;

use crate::ports::AnalyzeError;

/// Characters of offending output quoted back in error messages
pub const EXCERPT_CHARS: usize = 200;

/// Phrases that indicate the model asked a question instead of answering
const CLARIFYING_PHRASES: &[&str] = &[
    "please provide",
    "i need",
    "could you",
    "can you provide",
    "clarify",
    "more details",
    "more information",
    "i'm sorry",
    "i apologize",
];

/// Slice the outermost `{ ... }` span out of the text, or return it trimmed
pub fn recover_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Recover and parse the JSON object in model output
pub fn parse_recovered(raw: &str) -> Result<Value, AnalyzeError> {
    let candidate = recover_json(raw);

    serde_json::from_str(candidate).map_err(|e| {
        tracing::debug!(error = %e, "Recovered slice is not valid JSON");
        let quoted = excerpt(raw.trim(), EXCERPT_CHARS);

        if asks_for_clarification(raw) {
            AnalyzeError::MalformedOutput(format!(
                "The AI asked for more information instead of returning an analysis: \"{}\"",
                quoted
            ))
        } else {
            AnalyzeError::MalformedOutput(format!(
                "Failed to parse AI response as JSON ({}): \"{}\"",
                e, quoted
            ))
        }
    })
}

/// Heuristic match for apologetic or clarifying language
pub fn asks_for_clarification(text: &str) -> bool {
    let lower = text.to_lowercase();
    CLARIFYING_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// First `max_chars` characters of `text`, respecting char boundaries
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
