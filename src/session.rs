//! Document session: build-time pipeline, query-time pipeline, and the
//! session cache.
//!
//! A [`Session`] owns everything derived from one document: its segments,
//! their embeddings, and the similarity index over them. Build runs to
//! completion before any query is accepted. After build the session is
//! read-only, so concurrent queries may share it freely.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::answer;
use crate::chunk::chunk_page;
use crate::completion::CompletionProvider;
use crate::config::Config;
use crate::context;
use crate::dedupe::filter_redundant;
use crate::embedding::{embed_query, l2_normalize, EmbeddingProvider};
use crate::extract::extract_pages;
use crate::index::FlatIndex;
use crate::models::{RetrievalResult, Segment};
use crate::progress::{BuildProgressEvent, BuildProgressReporter};

/// Returned by [`Session::ask`] when retrieval produces nothing: an empty
/// document, or a query with no valid neighbors. Not an error.
pub const NO_RESULTS_ANSWER: &str = "No relevant passages found in the document.";

/// Hex SHA-256 of the document bytes; the session cache key.
pub fn document_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// One document's retrieval state, built once and queried many times.
pub struct Session {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
    segments: Vec<Segment>,
    index: FlatIndex,
    fingerprint: String,
}

impl Session {
    /// Build a session from raw PDF bytes: extract pages, chunk, embed,
    /// index.
    ///
    /// This is the blocking setup phase; no query runs until it returns. An
    /// empty or text-free document yields a valid session whose queries all
    /// answer [`NO_RESULTS_ANSWER`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unreadable document or an embedding failure.
    /// Query-time failures are absorbed; build-time failures are not.
    pub async fn build(
        bytes: &[u8],
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        reporter: &dyn BuildProgressReporter,
    ) -> Result<Self> {
        let fingerprint = document_fingerprint(bytes);
        let pages = extract_pages(bytes).context("Failed to extract document text")?;
        Self::from_pages(fingerprint, &pages, config, embedder, completer, reporter).await
    }

    /// Build a session from already-extracted page text, one string per page
    /// in page order. Used by hosts that run their own extraction; `build`
    /// delegates here after extracting.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or indexing fails.
    pub async fn from_pages(
        fingerprint: String,
        pages: &[String],
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        reporter: &dyn BuildProgressReporter,
    ) -> Result<Self> {
        let started = Instant::now();
        reporter.report(BuildProgressEvent::Extracting { pages: pages.len() });

        let mut segments = Vec::new();
        for (page_idx, page_text) in pages.iter().enumerate() {
            if page_text.trim().is_empty() {
                continue;
            }
            for text in chunk_page(
                page_text,
                config.chunking.target_words,
                config.chunking.overlap_sentences,
            ) {
                segments.push(Segment {
                    id: segments.len(),
                    page: page_idx + 1,
                    text,
                });
            }
        }

        let mut index = FlatIndex::new(embedder.dims());
        let total = segments.len();
        let mut embedded = 0usize;

        for batch in segments.chunks(config.embedding.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();
            let vectors = embedder
                .embed(&texts)
                .await
                .context("Failed to embed document segments")?;
            // Segment ids are index rows; a miscounting provider would break
            // that lockstep.
            if vectors.len() != texts.len() {
                anyhow::bail!(
                    "Embedding provider returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                );
            }

            for mut vector in vectors {
                l2_normalize(&mut vector);
                index.add(&vector)?;
            }

            embedded += batch.len();
            reporter.report(BuildProgressEvent::Embedding {
                n: embedded,
                total,
            });
        }

        let elapsed_secs = started.elapsed().as_secs_f64();
        reporter.report(BuildProgressEvent::Ready {
            segments: total,
            elapsed_secs,
        });
        info!(
            fingerprint = %fingerprint,
            pages = pages.len(),
            segments = total,
            elapsed_secs,
            "session built"
        );

        Ok(Self {
            config,
            embedder,
            completer,
            segments,
            index,
            fingerprint,
        })
    }

    /// The session's document fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of indexed segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The similarity index; read-only after build. The deduplicator and
    /// callers inspecting stored vectors go through this.
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Top-`top_k` segments for `query`, ordered by descending similarity.
    ///
    /// The query is embedded with the same provider and normalization used at
    /// build time. An empty index returns an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the query embedding fails.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let mut vector = embed_query(self.embedder.as_ref(), query).await?;
        l2_normalize(&mut vector);

        let results = self
            .index
            .search(&vector, top_k)
            .into_iter()
            .map(|(row, score)| {
                let segment = &self.segments[row];
                RetrievalResult {
                    segment_id: segment.id,
                    page: segment.page,
                    text: segment.text.clone(),
                    score,
                }
            })
            .collect();

        Ok(results)
    }

    /// Retrieve, deduplicate, and return the segments that would back an
    /// answer to `question`. The same set a call to [`Session::ask`] would
    /// use, exposed for preview and highlighting.
    ///
    /// # Errors
    ///
    /// Returns an error if the query embedding fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievalResult>> {
        let results = self.search(question, self.config.retrieval.top_k).await?;
        Ok(filter_redundant(results, &self.index))
    }

    /// Answer `question` from the document.
    ///
    /// Runs the full query pipeline: embed, search, dedupe, assemble,
    /// generate. Every failure inside it is absorbed into user-visible text;
    /// this method never errors.
    pub async fn ask(&self, question: &str) -> String {
        let results = match self.retrieve(question).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "query retrieval failed");
                return NO_RESULTS_ANSWER.to_string();
            }
        };
        debug!(
            question_len = question.len(),
            results = results.len(),
            "query retrieved"
        );

        if results.is_empty() {
            return NO_RESULTS_ANSWER.to_string();
        }

        let assembled = context::assemble(&results, self.config.retrieval.max_context_words);

        answer::generate(
            self.completer.as_ref(),
            &self.config.completion,
            question,
            &assembled,
        )
        .await
    }
}

/// Single-slot cache holding the session for the current document.
///
/// Expensive state (segments, vectors, index) is built once per unique
/// document identity and reused across questions. Supplying bytes with a
/// different fingerprint drops the old session and rebuilds.
#[derive(Default)]
pub struct SessionCache {
    current: Option<Arc<Session>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached session, if any.
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.clone()
    }

    /// Return the cached session when `bytes` hashes to its fingerprint,
    /// otherwise build a fresh one and cache it.
    ///
    /// # Errors
    ///
    /// Propagates build failures; a failed build leaves any previous session
    /// in place.
    pub async fn get_or_build(
        &mut self,
        bytes: &[u8],
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        reporter: &dyn BuildProgressReporter,
    ) -> Result<Arc<Session>> {
        let fingerprint = document_fingerprint(bytes);

        if let Some(session) = &self.current {
            if session.fingerprint() == fingerprint {
                return Ok(session.clone());
            }
            info!(old = %session.fingerprint(), new = %fingerprint, "document changed, rebuilding session");
        }

        let session =
            Arc::new(Session::build(bytes, config, embedder, completer, reporter).await?);
        self.current = Some(session.clone());
        Ok(session)
    }
}
