//! Sentence-checkpoint text chunker.
//!
//! Splits one page of extracted text into chunks that respect a word budget
//! without ever cutting inside a sentence. The splitter walks an alternating
//! stream of content and separator tokens (paragraph breaks, line breaks,
//! sentence terminators); every separator records the buffer as the last safe
//! checkpoint, and a flush emits the checkpoint so chunk boundaries always
//! land on a complete sentence. Consecutive chunks overlap by a fixed number
//! of whole sentences so context resumes grammatically at each boundary.
//!
//! Sentence detection is deliberately naive: `.`, `!`, `?` followed by
//! whitespace. Abbreviations ("Mr.") split here too; decimals do not.

use regex::Regex;
use std::sync::LazyLock;

/// Paragraph breaks, line breaks, and sentence terminators, in match priority.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n|\n|[.!?]").unwrap());

/// Split page text into sentence-bounded chunks of roughly `target_words`
/// words, with `overlap_sentences` whole sentences shared between consecutive
/// chunks.
///
/// A page with no recognizable separators yields a single oversized chunk;
/// empty or whitespace-only input yields no chunks.
pub fn chunk_page(text: &str, target_words: usize, overlap_sentences: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut checkpoint_len = 0usize;
    // Set when a flush landed exactly on a separator: the reseeded buffer
    // then ends at a terminator with no trailing whitespace, and the next
    // content token may carry none of its own (it followed a line break).
    let mut resumed = false;

    for (part, is_separator) in split_with_separators(text) {
        if resumed && !is_separator {
            if !current.is_empty()
                && !current.ends_with(char::is_whitespace)
                && !part.starts_with(char::is_whitespace)
            {
                current.push(' ');
            }
            resumed = false;
        }
        current.push_str(part);
        if is_separator {
            checkpoint_len = current.len();
        }
        if count_words(&current) < target_words {
            continue;
        }

        if checkpoint_len > 0 {
            // Flush the checkpointed prefix as a finished chunk. The buffer
            // resumes from the overlap sentences plus whatever was appended
            // past the checkpoint, so no source text is dropped.
            let finished = current[..checkpoint_len].trim().to_string();
            let remainder = current[checkpoint_len..].to_string();

            let sentences = split_sentences(&finished);
            let keep_from = sentences.len().saturating_sub(overlap_sentences);
            let mut reseeded = sentences[keep_from..].join(" ");
            // A paragraph-break checkpoint leaves no leading whitespace on the
            // remainder; keep the word boundary intact.
            if !reseeded.is_empty()
                && !remainder.is_empty()
                && !remainder.starts_with(char::is_whitespace)
            {
                reseeded.push(' ');
            }
            reseeded.push_str(&remainder);

            chunks.push(finished);
            current = reseeded;
            checkpoint_len = 0;
            resumed = remainder.is_empty();
        } else {
            // No sentence boundary seen yet: emit the whole buffer as one
            // oversized chunk, with nothing to overlap from.
            let whole = current.trim().to_string();
            if !whole.is_empty() {
                chunks.push(whole);
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }

    chunks
}

/// Tokenize into alternating content and separator slices, preserving both.
fn split_with_separators(text: &str) -> Vec<(&str, bool)> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in SEPARATORS.find_iter(text) {
        if m.start() > last {
            parts.push((&text[last..m.start()], false));
        }
        parts.push((m.as_str(), true));
        last = m.end();
    }
    if last < text.len() {
        parts.push((&text[last..], false));
    }
    parts
}

/// Split at a sentence terminator followed by whitespace, keeping the
/// terminator with its sentence. Text without terminators is one "sentence".
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let bytes = text.as_bytes();
    while i < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'.' | b'!' | b'?') {
            let after = i + 1;
            let ws_len = text[after..]
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum::<usize>();
            if ws_len > 0 {
                out.push(&text[start..after]);
                start = after + ws_len;
                i = start;
                continue;
            }
        }
        // Advance by whole chars; terminators are ASCII so byte stepping is
        // only taken through char boundaries here.
        i += 1;
        while i < bytes.len() && (bytes[i] & 0xC0) == 0x80 {
            i += 1;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn count_words(s: &str) -> usize {
    s.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten-word sentence with a distinguishing index.
    fn sentence(i: usize) -> String {
        format!("Sentence {i} has exactly ten words in it counting everything.")
    }

    fn normalize(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_page("", 120, 2).is_empty());
        assert!(chunk_page("   \n  ", 120, 2).is_empty());
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk_page("One short sentence.", 120, 2);
        assert_eq!(chunks, vec!["One short sentence.".to_string()]);
    }

    #[test]
    fn no_terminators_yields_single_oversized_chunk() {
        let text = (0..200).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = chunk_page(&text, 120, 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(normalize(&chunks[0]), normalize(&text));
    }

    #[test]
    fn boundaries_land_on_sentence_ends() {
        let text = (0..20).map(sentence).collect::<Vec<_>>().join(" ");
        let chunks = chunk_page(&text, 35, 2);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.ends_with('.'),
                "chunk ends mid-sentence: {:?}",
                chunk
            );
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap_sentences() {
        let text = (0..20).map(sentence).collect::<Vec<_>>().join(" ");
        let chunks = chunk_page(&text, 35, 2);
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let prev = split_sentences(&pair[0]);
            let next = split_sentences(&pair[1]);
            let tail: Vec<&str> = prev[prev.len().saturating_sub(2)..].to_vec();
            let head: Vec<&str> = next[..2.min(next.len())].to_vec();
            assert_eq!(tail, head, "overlap mismatch between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn concatenating_non_overlap_portions_reconstructs_text() {
        let text = (0..24).map(sentence).collect::<Vec<_>>().join(" ");
        let chunks = chunk_page(&text, 35, 2);

        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            let sentences = split_sentences(chunk);
            let fresh = &sentences[2.min(sentences.len())..];
            if !fresh.is_empty() {
                rebuilt.push(' ');
                rebuilt.push_str(&fresh.join(" "));
            }
        }
        assert_eq!(normalize(&rebuilt), normalize(&text));
    }

    #[test]
    fn zero_overlap_resumes_without_shared_sentences() {
        let text = (0..12).map(sentence).collect::<Vec<_>>().join(" ");
        let chunks = chunk_page(&text, 35, 0);
        assert!(chunks.len() > 1);
        let rebuilt = chunks.join(" ");
        assert_eq!(normalize(&rebuilt), normalize(&text));
    }

    #[test]
    fn paragraph_breaks_count_as_checkpoints() {
        let para: String = (0..8).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let text = format!("{para}\n\n{para}\n\n{para}\n\n{para}");
        let chunks = chunk_page(&text, 20, 2);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn flush_on_separator_keeps_word_boundary() {
        // Ten-word sentences with target 20 push the word count to the
        // budget mid-stream, so flushes land on the "?" and "\n" separator
        // tokens themselves and the resumed buffer ends at a terminator.
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa. \
                    Lambda mu nu xi omicron pi rho sigma tau upsilon?\n\
                    Phi chi psi omega aleph bet gimel dalet he vav.";
        let chunks = chunk_page(text, 20, 2);

        for chunk in &chunks {
            for (idx, _) in chunk.match_indices(['.', '!', '?']) {
                let rest = &chunk[idx + 1..];
                assert!(
                    rest.is_empty()
                        || rest.starts_with(char::is_whitespace)
                        || rest.starts_with(['.', '!', '?']),
                    "terminator fused to following word in {:?}",
                    chunk
                );
            }
        }

        // Every source word survives intact in some chunk. Terminators may
        // migrate to a neighboring chunk, so compare words without them.
        let strip = |w: &str| w.trim_matches(['.', '!', '?']).to_string();
        let emitted: std::collections::HashSet<String> = chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .map(strip)
            .collect();
        for word in text.split_whitespace().map(strip) {
            assert!(emitted.contains(&word), "word {:?} lost or fused", word);
        }
    }

    #[test]
    fn sentence_splitter_keeps_terminators() {
        let parts = split_sentences("First one. Second two! Third three? Tail");
        assert_eq!(
            parts,
            vec!["First one.", "Second two!", "Third three?", "Tail"]
        );
    }

    #[test]
    fn sentence_splitter_requires_trailing_whitespace() {
        // Decimal points and run-together punctuation are not boundaries.
        let parts = split_sentences("Pi is 3.14 exactly. Version 2.0 shipped.");
        assert_eq!(parts, vec!["Pi is 3.14 exactly.", "Version 2.0 shipped."]);
    }

    #[test]
    fn deterministic() {
        let text = (0..16).map(sentence).collect::<Vec<_>>().join(" ");
        assert_eq!(chunk_page(&text, 40, 2), chunk_page(&text, 40, 2));
    }
}
