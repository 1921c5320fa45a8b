//! Maps retrieved segments back to on-page regions for visual highlighting.
//!
//! Page search, annotation, and rasterization belong to the embedding
//! application (whatever renders the document); this module owns the
//! orchestration: which text to search for, the fallback keys when exact
//! search misses, and the once-per-page rendering discipline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use crate::models::RetrievalResult;

/// Minimum length for the first-line fallback search key.
const MIN_LINE_KEY_LEN: usize = 20;
/// Byte length of the prefix fallback search key.
const PREFIX_KEY_LEN: usize = 120;
/// Minimum length for the prefix fallback search key.
const MIN_PREFIX_KEY_LEN: usize = 10;
/// Rasterization scale for rendered page images.
const RENDER_SCALE: f32 = 2.0;

/// An axis-aligned region on a page, in page coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Rendering-side view of the open document.
///
/// Implemented by the hosting application over its PDF renderer. Pages are
/// 0-indexed here; [`RetrievalResult::page`] is 1-based and converted by the
/// locator.
pub trait DocumentView {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;
    /// Exact-match text search on a page; empty when the text is not found.
    fn search_text(&self, page: usize, needle: &str) -> Vec<Rect>;
    /// Add a highlight annotation over each region.
    fn highlight(&mut self, page: usize, regions: &[Rect]);
    /// Rasterize a page at `scale` and return encoded PNG bytes.
    fn render_page(&self, page: usize, scale: f32) -> Result<Vec<u8>>;
}

/// Create a unique per-session scratch directory for rendered page images
/// under the OS temp dir.
///
/// Images are ephemeral presentation output; callers that want them somewhere
/// specific pass their own directory to [`highlight_results`] instead.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn default_output_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("highlighted_pages_{}", Uuid::new_v4().simple()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Highlight each result's text on its page and render every touched page
/// once.
///
/// Exact search runs first; extraction-to-source mismatches (whitespace,
/// ligatures) make misses common, so two shortened keys are tried next: the
/// text's first line, then its first [`PREFIX_KEY_LEN`] bytes. A segment whose
/// text cannot be found on its recorded page is silently skipped. Each unique
/// page is rasterized once at [`RENDER_SCALE`] regardless of how many results
/// landed on it, written as `page_{n}.png` (1-based) under `output_dir`.
///
/// Returns the paths of the images produced, in first-touch order.
///
/// # Errors
///
/// Returns an error only for filesystem or render failures; locator misses
/// are not errors.
pub fn highlight_results(
    view: &mut dyn DocumentView,
    results: &[RetrievalResult],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut pages_done: HashSet<usize> = HashSet::new();
    let mut produced = Vec::new();

    for result in results {
        if result.page == 0 || result.page > view.page_count() {
            continue;
        }
        let page = result.page - 1;

        let hits = find_regions(view, page, result.text.trim());
        if hits.is_empty() {
            debug!(page = result.page, "segment text not found on page, skipping highlight");
        } else {
            view.highlight(page, &hits);
        }

        if pages_done.insert(page) {
            let png = view.render_page(page, RENDER_SCALE)?;
            let out_path = output_dir.join(format!("page_{}.png", result.page));
            std::fs::write(&out_path, png)?;
            produced.push(out_path);
        }
    }

    Ok(produced)
}

/// Search for `text` on `page`, falling back to shortened keys on a miss.
fn find_regions(view: &dyn DocumentView, page: usize, text: &str) -> Vec<Rect> {
    let hits = view.search_text(page, text);
    if !hits.is_empty() {
        return hits;
    }

    if let Some(line) = text.lines().next() {
        if line.len() > MIN_LINE_KEY_LEN {
            let hits = view.search_text(page, line);
            if !hits.is_empty() {
                return hits;
            }
        }
    }

    let prefix = truncate_at_boundary(text, PREFIX_KEY_LEN).trim();
    if prefix.len() > MIN_PREFIX_KEY_LEN {
        let hits = view.search_text(page, prefix);
        if !hits.is_empty() {
            return hits;
        }
    }

    Vec::new()
}

/// Longest prefix of `text` at most `max_bytes` long that ends on a char
/// boundary.
fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
