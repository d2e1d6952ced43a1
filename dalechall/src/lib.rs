//! dalechall
//! ---
//! Lexical statistics and Dale-Chall readability scores over a corpus with one sentence
//! per line, computed as `lexflow` dataflows.
//!
//! A job reads the corpus into partitions, normalizes and counts words, classifies each
//! distinct word against an easy-word list and combines the totals into
//!
//! ```text
//! score = 0.1579 * (difficult / words * 100) + 0.0496 * (words / sentences)
//! ```
//!
//! Example
//! ---
//!
//! ```rust
//! use std::sync::Arc;
//! use lexflow::ExecutionContext;
//! use dalechall::{run_job, Lexicon, Mode, Report};
//! use dalechall::source::corpus_from_sentences;
//!
//! let ctx = ExecutionContext::greedy(4);
//! let corpus = corpus_from_sentences(vec!["The cat sat on the mat.", "It was happy."], 2);
//! let lexicon = Arc::new(Lexicon::new(vec!["the", "cat", "sat", "on", "mat", "it", "was"]));
//!
//! let report = run_job(&ctx, &corpus, Mode::Dff, 4, Some(lexicon)).unwrap();
//! assert_eq!(report, Report::Difficult { count: 1 });
//! ```

#[macro_use]
extern crate log;

pub mod classify;
pub mod config;
pub mod counts;
pub mod error;
pub mod inflection;
pub mod job;
pub mod lexicon;
pub mod report;
pub mod score;
pub mod source;
pub mod text;

pub use crate::config::{Args, JobConfig, SchedulerKind};
pub use crate::counts::WordCount;
pub use crate::error::AnalysisError;
pub use crate::job::{run_job, Mode};
pub use crate::lexicon::{DifficultyLabel, Lexicon};
pub use crate::report::{OutputFormat, Report};
