//! lexflow
//!
//! `lexflow` provides primitives for building and running task-based computations.
//!
//! What is it?
//! ---
//!
//! `lexflow` makes it easy to write deferred, data parallel computations that are executed
//! concurrently across a local machine.  Graphs are built lazily and only run when a value
//! is requested from an `ExecutionContext`, which owns the scheduler, the retry policy and
//! the cancellation token for a single job.
//!
//! How to Use It?
//! ---
//!
//! `Deferred` represents a computation.  `Deferred` objects are built with three functions:
//!
//! 1. `lift` - Lift takes a concrete value and lifts it into a Deferred object
//! 2. `apply` - Apply applies a function to a Deferred, producing a new Deferred object.
//! 3. `join` -  Join combines two Deferred objects with a joiner function, producing a new Deferred.
//!
//! Every task is a pure function of its inputs.  A task that fails or panics is evaluated
//! again, up to the context's attempt limit, before the job reports which stage failed.
//!
//! Example - Hello World!
//! ---
//! ```rust
//! use lexflow::deferred::Deferred;
//! use lexflow::ExecutionContext;
//!
//! let ctx = ExecutionContext::greedy(4);
//! let hello = Deferred::lift("Hello".to_owned(), None);
//! let world = Deferred::lift("World".to_owned(), None);
//! let world_exclaim = world.apply(|w| format!("{}!", w));
//! let hello_world = hello.join(&world_exclaim, |h, w| format!("{} {}", h, w));
//! assert_eq!(hello_world.run(&ctx), Ok("Hello World!".into()));
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

/// Contains Deferred primitive and function definitions
pub mod deferred;

/// Contains Scheduler trait definition and implementations
pub mod scheduler;

/// Execution context, run policy and cancellation
pub mod context;

/// Engine error type
pub mod error;

/// Internal Graph implementation
mod graph;

/// Internal task definitions
mod task;

pub use context::{CancelToken, ExecutionContext, RunPolicy};
pub use error::EngineError;
pub use graph::{FnArgs, Graph, Handle, Input, Task};
pub use task::BASS;
