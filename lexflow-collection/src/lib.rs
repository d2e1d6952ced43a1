//! lexflow-collection
//! ---
//! lexflow-collection is a medium-level dataflow library for batch text processing.
//!
//! What is it?
//! ---
//! lexflow-collection provides dataflow operators over partitioned data.  Each partition is
//! an independent task in a `lexflow` graph; group-by style operators combine values inside
//! each partition first, hash-shuffle the partial results and merge them as a tree.
//!
//! Example - Word Count
//! ---
//!
//! ```rust
//! use lexflow::ExecutionContext;
//! use lexflow_collection::collection::memory::MemoryCollection;
//!
//! let ctx = ExecutionContext::greedy(4);
//! let lines = MemoryCollection::parallelize(
//!     vec!["the cat".to_owned(), "the hat".to_owned()], 2);
//!
//! let counts = lines
//!     .emit(|line, emitter| {
//!         for word in line.split_whitespace() {
//!             emitter(word.to_owned());
//!         }
//!     })
//!     .frequencies(2)
//!     .coalesce()
//!     .sort_by(|(word, _count)| word.clone());
//!
//! assert_eq!(counts.run(&ctx), Ok(vec![
//!     ("cat".to_owned(), 1),
//!     ("hat".to_owned(), 1),
//!     ("the".to_owned(), 2)
//! ]));
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

/// Defines useful utilities, such as reading files
pub mod utils;

/// Defines the MemoryCollection primitive
pub mod collection;

mod partitioned;
