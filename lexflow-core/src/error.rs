use thiserror::Error;

/// Failures surfaced by a Scheduler while computing a Graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {

    /// A task kept failing after every allowed attempt
    #[error("stage `{stage}` failed after {attempts} attempt(s): {cause}")]
    StageFailed { stage: String, attempts: usize, cause: String },

    /// The job was cancelled between stages
    #[error("job cancelled with {pending} task chain(s) not yet run")]
    Cancelled { pending: usize },

    /// A requested output, or an input to a task, was never produced
    #[error("stage `{stage}` produced no output")]
    MissingOutput { stage: String },

    /// A stage produced a value of a different type than its consumer expects
    #[error("stage `{stage}` produced a value of an unexpected type")]
    TypeMismatch { stage: String },

    /// A worker went away without reporting back
    #[error("worker pool stopped before all tasks reported back")]
    WorkerLost,
}
