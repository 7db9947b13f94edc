//! # article-rewriter
//!
//! Batch-rewrites a folder of Word documents through the OpenAI chat API.
//!
//! ## Features
//!
//! - Minimal .docx codec (read paragraphs, write a single-paragraph document)
//! - Bounded retry with a fixed pause/delay schedule and an explicit
//!   exhausted-retries error
//! - Strictly sequential per-file processing with 1-based progress
//!   accounting over every directory entry
//! - Explicit per-file failure policy: abort the run or skip and report
//! - Channel-based progress events for UI embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use article_rewriter::{Config, BatchRunner, RewriteClient, LogSink};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input_dir("./articles")
//!     .output_dir("./rewritten")
//!     .api_key(std::env::var("OPENAI_API_KEY")?)
//!     .build();
//!
//! let client = RewriteClient::from_config(&config)?;
//! let report = BatchRunner::new(config, client)?.run(&LogSink)?;
//! report.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Codec** (`docx`): extracts and persists document text
//! 2. **Client** (`client`): one chat-completion call per document, with retry
//! 3. **Runner** (`runner`): walks the directory, drives codec and client,
//!    emits progress
//! 4. **Progress** (`progress`): sink trait and channel events for the
//!    foreground consumer

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
mod progress;
mod runner;

pub mod docx;

pub use client::{ChatBackend, OpenAiBackend, RewriteClient, Sleep, ThreadSleep};
pub use config::{Config, ConfigBuilder, FailurePolicy, RetryPolicy};
pub use error::{Error, Result};
pub use progress::{ChannelSink, LogSink, ProgressEvent, ProgressSink};
pub use runner::{BatchRunner, FileFailure, Job, RunOutcome, RunReport};

/// Runs one complete rewrite batch with the given configuration.
///
/// This is the main entry point for the library: it builds the OpenAI
/// client from the configuration and drives the runner to completion,
/// reporting through `sink`.
///
/// # Errors
///
/// Returns an error if:
/// - The API key is absent
/// - The input directory doesn't exist
/// - The output directory cannot be created
/// - A file fails under [`FailurePolicy::Abort`]
///
/// # Examples
///
/// ```no_run
/// use article_rewriter::{run, Config, LogSink};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .input_dir("./articles")
///     .api_key("sk-...")
///     .build();
///
/// run(config, &LogSink)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config, sink: &dyn ProgressSink) -> Result<RunReport> {
    let client = RewriteClient::from_config(&config)?;
    BatchRunner::new(config, client)?.run(sink)
}
