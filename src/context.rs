//! Context assembly for the completion prompt.
//!
//! Orders surviving segments by page so the model reads passages in document
//! order rather than relevance order (the answer prompt asks for
//! chronological reasoning), labels each with its source page, and trims the
//! result to a word budget without leaving a dangling clause.

use crate::models::RetrievalResult;

/// Concatenate retrieved segments into a page-ordered, word-budgeted context
/// string.
///
/// Segments are stably sorted ascending by page (ties keep retrieval order)
/// and joined as `"[Page P] text"` blocks separated by blank lines. The
/// result is truncated to the first `max_words` words, then any trailing
/// partial sentence is stripped: everything after the last `.`, `!`, or `?`
/// is dropped. If no terminator survives the truncation the text is left
/// as-is.
pub fn assemble(results: &[RetrievalResult], max_words: usize) -> String {
    let mut ordered: Vec<&RetrievalResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.page);

    let joined = ordered
        .iter()
        .map(|r| format!("[Page {}] {}", r.page, r.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let truncated = joined
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    strip_trailing_partial_sentence(&truncated)
}

/// Drop everything after the last sentence terminator, if one exists.
fn strip_trailing_partial_sentence(text: &str) -> String {
    match text.rfind(['.', '!', '?']) {
        // Terminators are ASCII, so the +1 byte offset is a char boundary.
        Some(i) => text[..=i].to_string(),
        None => text.to_string(),
    }
}
