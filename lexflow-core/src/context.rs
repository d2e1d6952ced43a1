use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::EngineError;
use crate::graph::{Graph, Handle};
use crate::scheduler::{GreedyScheduler, LeveledScheduler, Scheduler};
use crate::task::BASS;

/// Shared flag used to stop a running job between stages.
#[derive(Debug,Clone,Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that has not been cancelled
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Requests cancellation.  Tasks already running finish; nothing new starts.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run knobs a Scheduler must honor
#[derive(Debug,Clone)]
pub struct RunPolicy {

    /// How many times a task is evaluated before its failure aborts the job
    pub max_attempts: usize,

    /// Checked between levels and before dispatching work
    pub cancel: CancelToken
}

impl Default for RunPolicy {
    fn default() -> Self {
        RunPolicy { max_attempts: 1, cancel: CancelToken::new() }
    }
}

/// Everything needed to execute Deferred computations for one job.  A context is
/// created when a job starts and handed to whatever runs the pipeline; nothing
/// about it is global.
pub struct ExecutionContext {
    scheduler: Box<dyn Scheduler + Send + Sync>,
    policy: RunPolicy
}

impl ExecutionContext {

    /// Creates a context backed by the given scheduler
    pub fn new<S: Scheduler + Send + Sync + 'static>(scheduler: S) -> Self {
        ExecutionContext {
            scheduler: Box::new(scheduler),
            policy: RunPolicy::default()
        }
    }

    /// Context running each level of the graph on the rayon pool
    pub fn leveled() -> Self {
        ExecutionContext::new(LeveledScheduler)
    }

    /// Context running tasks on a dedicated pool of `n_threads` workers
    pub fn greedy(n_threads: usize) -> Self {
        ExecutionContext::new(GreedyScheduler::new(n_threads))
    }

    /// Sets how many times a failing task is attempted.  Values below one are treated
    /// as one.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    /// Maximum attempts per task
    pub fn max_attempts(&self) -> usize {
        self.policy.max_attempts
    }

    /// Token that cancels jobs run through this context
    pub fn cancel_token(&self) -> CancelToken {
        self.policy.cancel.clone()
    }

    /// Computes the requested outputs of a graph
    pub fn compute(
        &self,
        graph: Arc<Graph>,
        outputs: &[Arc<Handle>]
    ) -> Result<Vec<Arc<BASS>>, EngineError> {
        if self.policy.cancel.is_cancelled() {
            return Err(EngineError::Cancelled { pending: graph.len() });
        }
        debug!("Computing {} output(s) over {} task(s)", outputs.len(), graph.len());
        self.scheduler.compute(graph, outputs, &self.policy)
    }
}
