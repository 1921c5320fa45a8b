//! # Doc Chat
//!
//! Retrieval-augmented question answering over a single uploaded document.
//!
//! Doc Chat turns a PDF into an in-memory retrieval session: page text is
//! chunked into sentence-respecting segments, embedded into unit-normalized
//! vectors, and indexed for exact cosine search. Questions are answered by
//! retrieving the nearest segments, deduplicating them, assembling a
//! page-ordered context, and asking a completion model. Retrieved segments
//! can optionally be mapped back to page coordinates for highlighting.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌───────────┐
//! │ Extract  │──▶│   Chunk     │──▶│ Embed +   │      (build time)
//! │ per page │   │  + overlap  │   │ FlatIndex │
//! └──────────┘   └─────────────┘   └─────┬─────┘
//!                                        │
//!   question ──▶ search ──▶ dedupe ──▶ assemble ──▶ generate   (query time)
//!                                        │
//!                  retrieved segments ──▶ locate/highlight     (presentation)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use doc_chat::config::Config;
//! use doc_chat::progress::StderrProgress;
//! use doc_chat::session::Session;
//!
//! let config = Config::default();
//! let embedder = doc_chat::embedding::create_provider(&config.embedding)?;
//! let completer = doc_chat::completion::create_provider(&config.completion)?;
//!
//! let bytes = std::fs::read("textbook.pdf")?;
//! let session = Session::build(
//!     &bytes,
//!     config,
//!     Arc::from(embedder),
//!     Arc::from(completer),
//!     &StderrProgress,
//! )
//! .await?;
//!
//! let answer = session.ask("When was the treaty signed?").await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`chunk`] | Sentence-checkpoint text chunking |
//! | [`embedding`] | Embedding provider abstraction and vector utilities |
//! | [`index`] | Flat exact inner-product index |
//! | [`dedupe`] | Near-duplicate filtering of retrieved segments |
//! | [`context`] | Page-ordered context assembly |
//! | [`completion`] | Completion provider abstraction |
//! | [`answer`] | Prompt construction and fallback handling |
//! | [`locate`] | Segment-to-page highlighting orchestration |
//! | [`progress`] | Index build progress reporting |
//! | [`session`] | Per-document session and cache |

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod context;
pub mod dedupe;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod locate;
pub mod models;
pub mod progress;
pub mod session;
