//! Core data types that flow through the indexing and query pipeline.

/// One sentence-bounded slice of a document page, created at index-build time.
///
/// `id` is the segment's position in the session's segment collection and the
/// row index of its embedding in the flat index. The two are kept in lockstep
/// by construction: segments and index rows are appended together and never
/// reordered or removed.
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: usize,
    /// 1-based page number the text was extracted from.
    pub page: usize,
    pub text: String,
}

/// A retrieved segment with its similarity score, produced per query.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Row index into the session's segment collection and flat index.
    pub segment_id: usize,
    /// 1-based page number, copied from the segment.
    pub page: usize,
    pub text: String,
    /// Cosine similarity to the query (inner product of unit vectors).
    pub score: f32,
}

impl RetrievalResult {
    /// Word-capped excerpt for display, e.g. when previewing retrieved chunks.
    pub fn preview(&self, max_words: usize) -> String {
        let words: Vec<&str> = self.text.split_whitespace().take(max_words).collect();
        let mut out = words.join(" ");
        if self.text.split_whitespace().count() > max_words {
            out.push_str("...");
        }
        out
    }
}
