//! Index build progress reporting.
//!
//! Reports observable progress while a document is extracted and embedded so
//! callers can show what phase the build is in and how much is left.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event during an index build.
#[derive(Clone, Debug)]
pub enum BuildProgressEvent {
    /// Page text extraction finished; chunking is about to start.
    Extracting { pages: usize },
    /// Embedding phase: n segments embedded out of total.
    Embedding { n: usize, total: usize },
    /// Build complete; the session can answer questions.
    Ready {
        segments: usize,
        elapsed_secs: f64,
    },
}

/// Reports build progress. Implementations write to stderr (human or JSON).
pub trait BuildProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the session build pipeline.
    fn report(&self, event: BuildProgressEvent);
}

/// Human-friendly progress on stderr: "index  embedding  1,234 / 5,000 segments".
pub struct StderrProgress;

impl BuildProgressReporter for StderrProgress {
    fn report(&self, event: BuildProgressEvent) {
        let line = match &event {
            BuildProgressEvent::Extracting { pages } => {
                format!("index  extracting  {} pages\n", format_number(*pages as u64))
            }
            BuildProgressEvent::Embedding { n, total } => {
                format!(
                    "index  embedding  {} / {} segments\n",
                    format_number(*n as u64),
                    format_number(*total as u64)
                )
            }
            BuildProgressEvent::Ready {
                segments,
                elapsed_secs,
            } => {
                format!(
                    "index  ready  {} segments in {:.1}s\n",
                    format_number(*segments as u64),
                    elapsed_secs
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BuildProgressReporter for JsonProgress {
    fn report(&self, event: BuildProgressEvent) {
        let obj = match &event {
            BuildProgressEvent::Extracting { pages } => serde_json::json!({
                "event": "progress",
                "phase": "extracting",
                "pages": pages
            }),
            BuildProgressEvent::Embedding { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "embedding",
                "n": n,
                "total": total
            }),
            BuildProgressEvent::Ready {
                segments,
                elapsed_secs,
            } => serde_json::json!({
                "event": "progress",
                "phase": "ready",
                "segments": segments,
                "elapsed_secs": elapsed_secs
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BuildProgressReporter for NoProgress {
    fn report(&self, _event: BuildProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
