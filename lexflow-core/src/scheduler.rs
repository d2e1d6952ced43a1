use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use jobpool::JobPool;
use log::Level::{Debug as LDebug, Trace};
use priority_queue::PriorityQueue;
use rayon::prelude::*;

use crate::context::RunPolicy;
use crate::error::EngineError;
use crate::graph::{FnArgs, Graph, Handle, Task};
use crate::task::{DynArgs, TaskError, BASS};

type DepGraph = HashMap<Arc<Handle>, HashSet<Arc<Handle>>>;
type ChainGraph = HashMap<Vec<Arc<Handle>>, HashSet<Arc<Handle>>>;
type Store = Arc<Mutex<DataStore<Arc<Handle>, Arc<BASS>>>>;

/// Holds task outputs until their last consumer has read them.
#[derive(Debug)]
struct DataStore<K: PartialEq + Hash + Eq, V> {
    data: HashMap<K, V>,
    counts: HashMap<K, usize>
}

impl <K: PartialEq + Hash + Eq, V: Clone> DataStore<K,V> {
    fn new(counts: HashMap<K, usize>) -> Self {
        DataStore { data: HashMap::new(), counts }
    }

    fn get(&mut self, handle: &K) -> Option<V> {
        let remaining = self.counts.get_mut(handle).map(|c| {
            *c = c.saturating_sub(1);
            *c
        }).unwrap_or(0);

        if remaining == 0 {
            self.data.remove(handle)
        } else {
            self.data.get(handle).cloned()
        }
    }

    fn insert(&mut self, handle: K, data: V) {
        self.data.insert(handle, data);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<T> {
    // Task panics are caught before the store is touched, so a poisoned lock still
    // holds consistent data.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executes a Graph, producing the values for the requested output handles.  This is
/// the seam between collections and whatever actually runs the tasks.
pub trait Scheduler {
    fn compute(
        &self,
        graph: Arc<Graph>,
        outputs: &[Arc<Handle>],
        policy: &RunPolicy
    ) -> Result<Vec<Arc<BASS>>, EngineError>;
}

enum Limbo {
    One(Arc<BASS>),
    Two(Arc<BASS>, Arc<BASS>)
}

fn missing(h: &Handle) -> EngineError {
    EngineError::MissingOutput { stage: h.name().to_owned() }
}

fn get_fnargs(ds: &mut DataStore<Arc<Handle>,Arc<BASS>>, fa: &FnArgs) -> Result<Limbo, EngineError> {
    match fa {
        FnArgs::Single(h) => {
            ds.get(h).map(Limbo::One).ok_or_else(|| missing(h))
        },
        FnArgs::Join(l, r) => {
            let left = ds.get(l).ok_or_else(|| missing(l))?;
            let right = ds.get(r).ok_or_else(|| missing(r))?;
            Ok(Limbo::Two(left, right))
        }
    }
}

// Converts a flattened graph into inbound and outbound dependency lists
fn build_dep_graph(graph: &Graph) -> (DepGraph, DepGraph) {
    let mut inbound: DepGraph = HashMap::new();
    let mut outbound: DepGraph = HashMap::new();
    for (output, inputs) in graph.dependencies.iter() {
        let hs: HashSet<Arc<Handle>> = inputs.iter()
            .flat_map(|fa| fa.handles())
            .cloned()
            .collect();

        for h in hs.iter() {
            outbound.entry(h.clone()).or_default().insert(output.clone());
        }
        inbound.insert(output.clone(), hs);
    }
    (inbound, outbound)
}

// Tasks reading exactly one input.  Only these may continue another task's chain; a join
// needs both of its arguments from the store, even when they name the same handle.
fn single_input_tasks(graph: &Graph) -> HashSet<Arc<Handle>> {
    graph.dependencies.iter()
        .filter(|(_, fa)| matches!(fa.as_deref(), Some(FnArgs::Single(_))))
        .map(|(h, _)| h.clone())
        .collect()
}

// Constructs sets of chains that have no dependencies between them
fn generate_levels(collapsed: ChainGraph) -> Vec<Vec<Vec<Arc<Handle>>>> {
    let mut outbound: HashMap<&Arc<Handle>, HashSet<&Vec<Arc<Handle>>>> = HashMap::new();
    for (nodes, deps) in collapsed.iter() {
        for d in deps.iter() {
            outbound.entry(d).or_default().insert(nodes);
        }
    }
    let mut inbound = collapsed.clone();
    let mut levels = Vec::new();
    let mut cur_level: Vec<Vec<Arc<Handle>>> = inbound.iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k.clone())
        .collect();

    while !cur_level.is_empty() {
        for chain in cur_level.iter() {
            inbound.remove(chain);
        }

        let mut next_level = Vec::new();
        for chain in cur_level.iter() {
            let last = &chain[chain.len() - 1];
            if let Some(node_set) = outbound.get(last) {
                for node in node_set.iter() {
                    if let Some(set) = inbound.get_mut(*node) {
                        set.remove(last);
                        if set.is_empty() {
                            next_level.push((*node).clone());
                        }
                    }
                }
            }
        }

        levels.push(cur_level);
        cur_level = next_level;
    }

    if log_enabled!(LDebug) {
        let mut max_con = 0usize;
        for (i, l) in levels.iter().enumerate() {
            max_con = max_con.max(l.len());
            debug!("Level: {}, Chains: {}", i, l.len());
        }
        debug!("Max Concurrency: {}", max_con);
    }
    levels
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_owned()
    }
}

fn eval_once(task: &Task, args: Option<&Limbo>) -> Result<BASS, TaskError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        match task {
            Task::Input(input) => Ok(input.read()),
            Task::Function(t) => match args {
                Some(Limbo::One(a)) => t.eval(DynArgs::One(a)),
                Some(Limbo::Two(a, b)) => t.eval(DynArgs::Two(a, b)),
                None => Err(TaskError::Failed("task has no inputs".into()))
            }
        }
    }));
    outcome.unwrap_or_else(|payload| {
        Err(TaskError::Failed(format!("panicked: {}", panic_message(payload.as_ref()))))
    })
}

// Tasks are pure functions of their inputs, so a failed evaluation is simply run again
// against the same arguments.
fn eval_with_retry(
    handle: &Handle,
    task: &Task,
    args: Option<&Limbo>,
    policy: &RunPolicy
) -> Result<BASS, EngineError> {
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match eval_once(task, args) {
            Ok(out) => return Ok(out),
            Err(TaskError::TypeMismatch) => {
                return Err(EngineError::TypeMismatch { stage: handle.name().to_owned() })
            },
            Err(TaskError::Failed(cause)) => {
                if attempt >= policy.max_attempts {
                    error!("Task {} failed after {} attempt(s): {}", handle, attempt, cause);
                    return Err(EngineError::StageFailed {
                        stage: handle.name().to_owned(),
                        attempts: attempt,
                        cause
                    });
                }
                warn!("Task {} failed on attempt {}/{}, retrying: {}",
                      handle, attempt, policy.max_attempts, cause);
            }
        }
    }
}

fn run_chain(
    graph: &Graph,
    chain: &[Arc<Handle>],
    store: &Store,
    policy: &RunPolicy
) -> Result<(), EngineError> {
    trace!("Reading dependencies for chain {}", chain[0]);
    let mut largs = {
        let mut ds = lock(store);
        match graph.dependencies.get(&chain[0]) {
            Some(Some(fa)) => Some(get_fnargs(&mut ds, fa)?),
            _              => None
        }
    };

    for handle in chain {
        trace!("Processing handle: {}", handle);
        let task = graph.tasks.get(handle).ok_or_else(|| missing(handle))?;
        let out = eval_with_retry(handle, task, largs.as_ref(), policy)?;
        largs = Some(Limbo::One(Arc::new(out)));
    }

    if let (Some(Limbo::One(d)), Some(last)) = (largs, chain.last()) {
        lock(store).insert(last.clone(), d);
    }
    Ok(())
}

// Finds chains of tasks that can be collapsed into a single unit of work
fn collapse_graph<K: Hash + Eq + Debug + Clone, F: Fn(&K) -> bool>(
    mut nodes: HashMap<K, HashSet<K>>,
    single_input: F
) -> HashMap<Vec<K>, HashSet<K>> {

    let mut outbound: HashMap<K, Vec<K>> = HashMap::new();
    let mut roots = Vec::new();
    let mut inbound: HashMap<K, Vec<K>> = HashMap::new();
    for (node, deps) in nodes.iter() {
        outbound.entry(node.clone()).or_default();

        for d in deps.iter() {
            outbound.entry(d.clone()).or_default().push(node.clone());
        }

        if deps.is_empty() {
            roots.push(vec![node.clone()]);
        }

        inbound.insert(node.clone(), deps.iter().cloned().collect());
    }

    let mut new_nodes = HashMap::new();
    let mut seen = HashSet::new();
    while let Some(mut chain) = roots.pop() {
        let link = {
            let tail = &chain[chain.len() - 1];
            // A node with a single consumer that reads nothing else extends the chain
            match outbound[tail].as_slice() {
                [next] if inbound[next].len() == 1 && single_input(next) => Some(next.clone()),
                _ => None
            }
        };

        match link {
            Some(node) => {
                chain.push(node);
                roots.push(chain);
            },
            None => {
                for node in outbound[&chain[chain.len() - 1]].iter() {
                    if seen.insert(node.clone()) {
                        roots.push(vec![node.clone()]);
                    }
                }
                if let Some(deps) = nodes.remove(&chain[0]) {
                    new_nodes.insert(chain, deps);
                }
            }
        }
    }

    new_nodes
}

// Number of reads each handle will see: one per argument slot of every chain head plus
// one per requested output
fn consumer_counts(
    graph: &Graph,
    collapsed: &ChainGraph,
    outputs: &[Arc<Handle>]
) -> HashMap<Arc<Handle>, usize> {
    let mut counts: HashMap<Arc<Handle>, usize> = HashMap::new();
    for chain in collapsed.keys() {
        if let Some(Some(fa)) = graph.dependencies.get(&chain[0]) {
            for d in fa.handles() {
                *counts.entry(d.clone()).or_insert(0) += 1;
            }
        }
    }
    for o in outputs {
        *counts.entry(o.clone()).or_insert(0) += 1;
    }
    counts
}

fn collect_outputs(store: &Store, outputs: &[Arc<Handle>]) -> Result<Vec<Arc<BASS>>, EngineError> {
    let mut ds = lock(store);
    outputs.iter()
        .map(|h| ds.get(h).ok_or_else(|| missing(h)))
        .collect()
}

/// Runs the graph level by level, executing each level's chains in parallel on the
/// rayon pool.
pub struct LeveledScheduler;

impl Scheduler for LeveledScheduler {

    fn compute(
        &self,
        graph: Arc<Graph>,
        outputs: &[Arc<Handle>],
        policy: &RunPolicy
    ) -> Result<Vec<Arc<BASS>>, EngineError> {

        debug!("Number of Tasks Specified: {}", graph.len());

        let (inbound, _outbound) = build_dep_graph(&graph);
        let singles = single_input_tasks(&graph);
        let collapsed = collapse_graph(inbound, |h| singles.contains(h));

        debug!("Number of Chains to Run: {}", collapsed.len());

        let counts = consumer_counts(&graph, &collapsed, outputs);
        let mut pending = collapsed.len();
        let levels = generate_levels(collapsed);
        let store: Store = Arc::new(Mutex::new(DataStore::new(counts)));

        for (i, level) in levels.into_iter().enumerate() {
            if policy.cancel.is_cancelled() {
                info!("Cancelled before level {}", i);
                return Err(EngineError::Cancelled { pending });
            }
            debug!("Running level: {}", i);
            level.par_iter()
                .map(|chain| run_chain(&graph, chain, &store, policy))
                .collect::<Result<Vec<()>, EngineError>>()?;
            pending -= level.len();
        }

        debug!("Finished");
        collect_outputs(&store, outputs)
    }
}

/// Runs chains on a fixed pool of worker threads as soon as their inputs are ready,
/// preferring chains with the most inputs since they free the most memory.
pub struct GreedyScheduler(usize);

impl GreedyScheduler {
    pub fn new(n_threads: usize) -> Self { GreedyScheduler(n_threads.max(1)) }
}

impl Scheduler for GreedyScheduler {

    fn compute(
        &self,
        graph: Arc<Graph>,
        outputs: &[Arc<Handle>],
        policy: &RunPolicy
    ) -> Result<Vec<Arc<BASS>>, EngineError> {

        debug!("Number of Tasks Specified: {}", graph.len());

        let (inbound, mut outbound) = build_dep_graph(&graph);
        let singles = single_input_tasks(&graph);
        let collapsed = collapse_graph(inbound, |h| singles.contains(h));

        debug!("Number of Chains to Run: {}", collapsed.len());

        let counts = consumer_counts(&graph, &collapsed, outputs);
        let mut queue = PriorityQueue::new();
        for (chain, deps) in collapsed.iter() {
            if deps.is_empty() {
                queue.push(chain.clone(), 0usize);
            }
        }

        let mut pending = collapsed.len();
        let mut head_map: HashMap<_,_> = collapsed.into_iter().map(|(chain, deps)| {
            (chain[0].clone(), (chain, deps.len(), deps))
        }).collect();

        let store: Store = Arc::new(Mutex::new(DataStore::new(counts)));

        if log_enabled!(Trace) {
            trace!("Output: {:?}", outputs);
            for (index, (chain, _priority, deps)) in head_map.iter() {
                trace!("Index: {}, Chain: {:?}, Deps: {:?}", index, chain, deps);
            }
        }

        let mut failure = None;
        {
            let mut pool = JobPool::new(self.0);
            let mut in_flight = 0usize;
            let (tx, rx) = mpsc::channel();
            loop {
                if failure.is_none() && policy.cancel.is_cancelled() {
                    info!("Cancelled with {} chain(s) pending", pending);
                    failure = Some(EngineError::Cancelled { pending });
                }

                // Queue up all free items unless the job is already doomed
                while failure.is_none() && in_flight < self.0 {
                    let Some((chain, _priority)) = queue.pop() else { break };
                    trace!("Queueing chain: {:?}", chain);
                    let g = graph.clone();
                    let d = store.clone();
                    let p = policy.clone();
                    let thread_tx = tx.clone();
                    pool.queue(move || {
                        let res = run_chain(&g, &chain, &d, &p);
                        // Receiver only disappears once compute has returned
                        let _ = thread_tx.send((chain[chain.len() - 1].clone(), res));
                    });
                    in_flight += 1;
                }

                if in_flight == 0 {
                    break;
                }

                let (handle, res) = match rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => {
                        failure.get_or_insert(EngineError::WorkerLost);
                        break;
                    }
                };
                in_flight -= 1;
                pending = pending.saturating_sub(1);
                trace!("{} finished", handle);

                if let Err(e) = res {
                    failure.get_or_insert(e);
                    continue;
                }

                if let Some(out) = outbound.remove(&handle) {
                    for out_handle in out {
                        if let Some((chain, p, deps)) = head_map.get_mut(&out_handle) {
                            deps.remove(&handle);
                            if deps.is_empty() {
                                trace!("Adding new chain: {:?}", chain);
                                queue.push(chain.clone(), *p);
                            }
                        }
                    }
                }
            }
            pool.shutdown();
        }

        if let Some(e) = failure {
            return Err(e);
        }

        debug!("Finished");
        collect_outputs(&store, outputs)
    }
}

#[cfg(test)]
mod size_test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::context::ExecutionContext;
    use crate::deferred::{Deferred, batch_apply, tree_reduce};

    fn contexts(attempts: usize) -> Vec<ExecutionContext> {
        vec![
            ExecutionContext::leveled().with_max_attempts(attempts),
            ExecutionContext::greedy(3).with_max_attempts(attempts)
        ]
    }

    #[test]
    fn test_graph_collapse() {
        /*
        1 -> 2 -> 3
              \
               4 -> 5

        We should collapse 1 -> 2 and 4 -> 5
        */
        let mut deps: HashMap<usize, HashSet<usize>> = HashMap::new();
        deps.insert(1, HashSet::new());
        deps.insert(2, [1].iter().cloned().collect());
        deps.insert(3, [2].iter().cloned().collect());
        deps.insert(4, [2].iter().cloned().collect());
        deps.insert(5, [4].iter().cloned().collect());

        let out = collapse_graph(deps, |_| true);
        let mut res = HashMap::new();
        res.insert(vec![1, 2], HashSet::new());
        res.insert(vec![3], [2].iter().cloned().collect());
        res.insert(vec![4, 5], [2].iter().cloned().collect());

        assert_eq!(out, res);
    }

    #[test]
    fn test_graph_collapse_diamond() {
        /*
             2 -> 4
            /     |
           1 ---> 3

        */
        let mut deps: HashMap<usize, HashSet<usize>> = HashMap::new();
        deps.insert(1, HashSet::new());
        deps.insert(2, [1].iter().cloned().collect());
        deps.insert(3, [1].iter().cloned().collect());
        deps.insert(4, [2, 3].iter().cloned().collect());

        let res: HashMap<_, _> = deps.clone().into_iter().map(|(k, v)| (vec![k], v)).collect();
        let out = collapse_graph(deps, |_| true);

        assert_eq!(out, res);
    }

    #[test]
    fn test_graph_collapse_stops_at_joins() {
        /*
        1 -> 2 => 3   (3 reads 2 twice)
        */
        let mut deps: HashMap<usize, HashSet<usize>> = HashMap::new();
        deps.insert(1, HashSet::new());
        deps.insert(2, [1].iter().cloned().collect());
        deps.insert(3, [2].iter().cloned().collect());

        let out = collapse_graph(deps, |k| *k != 3);
        let mut res = HashMap::new();
        res.insert(vec![1, 2], HashSet::new());
        res.insert(vec![3], [2].iter().cloned().collect());

        assert_eq!(out, res);
    }

    #[test]
    fn test_join_with_itself() {
        let x = Deferred::lift(2usize, None).apply(|x| x + 1);
        let squared = x.join(&x, |a, b| a * b);
        let both = squared.join(&x, |s, x| s + x);
        for ctx in contexts(1) {
            assert_eq!(squared.run(&ctx), Ok(9));
            assert_eq!(both.run(&ctx), Ok(12));
            assert_eq!(Deferred::lift(4usize, None).join(&Deferred::lift(4usize, None), |a, b| a + b)
                       .run(&ctx), Ok(8));
        }
    }

    #[test]
    fn test_join_with_itself_counts_both_reads() {
        let x = Deferred::lift(7usize, None);
        let doubled = x.join(&x, |a, b| a + b);
        let graph = Arc::new(doubled.graph().clone());
        let singles = single_input_tasks(&graph);
        let (inbound, _) = build_dep_graph(&graph);
        let collapsed = collapse_graph(inbound, |h| singles.contains(h));
        assert_eq!(collapsed.len(), 2);
        let counts = consumer_counts(&graph, &collapsed, &[]);
        assert_eq!(counts.values().cloned().collect::<Vec<_>>(), vec![2]);
    }

    // Builds lift -> flip, with flip feeding two downstream chains that are joined.  Running
    // flip cancels the job, so nothing downstream may start.
    fn cancel_mid_graph(ctx: &ExecutionContext) -> (Deferred<usize>, Arc<AtomicUsize>) {
        let token = ctx.cancel_token();
        let ran = Arc::new(AtomicUsize::new(0));
        let flip = Deferred::lift(1usize, None).apply_named("Flip", move |x| {
            token.cancel();
            *x
        });
        let (r1, r2) = (ran.clone(), ran.clone());
        let left = flip.apply_named("Left", move |x| { r1.fetch_add(1, Ordering::SeqCst); x + 1 });
        let right = flip.apply_named("Right", move |x| { r2.fetch_add(1, Ordering::SeqCst); x + 2 });
        (left.join(&right, |l, r| l + r), ran)
    }

    #[test]
    fn test_leveled_cancels_between_levels() {
        let ctx = ExecutionContext::leveled();
        let (out, ran) = cancel_mid_graph(&ctx);
        match out.run(&ctx) {
            Err(EngineError::Cancelled { pending }) => assert!(pending > 0),
            other => panic!("expected cancellation, got {:?}", other)
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_greedy_cancels_before_dispatch() {
        let ctx = ExecutionContext::greedy(1);
        let (out, ran) = cancel_mid_graph(&ctx);
        match out.run(&ctx) {
            Err(EngineError::Cancelled { pending }) => assert_eq!(pending, 3),
            other => panic!("expected cancellation, got {:?}", other)
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shared_input_read_by_many() {
        let base = Deferred::lift(5usize, None);
        let parts: Vec<_> = (0..6usize).map(|i| base.apply(move |x| x + i)).collect();
        let total = tree_reduce(&parts, |x, y| x + y).unwrap();
        for ctx in contexts(1) {
            assert_eq!(total.run(&ctx), Ok(45));
        }
    }

    #[test]
    fn test_transient_failure_is_retried() {
        for ctx in contexts(3) {
            let calls = Arc::new(AtomicUsize::new(0));
            let c = calls.clone();
            let flaky = Deferred::lift(2usize, None).try_apply("Flaky", move |x| {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient".to_owned())
                } else {
                    Ok(x * 10)
                }
            });
            assert_eq!(flaky.run(&ctx), Ok(20));
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }

    #[test]
    fn test_panicking_task_reports_stage() {
        for ctx in contexts(2) {
            let defs: Vec<_> = (0..4usize).map(|x| Deferred::lift(x, None)).collect();
            let mapped = batch_apply(&defs, |_idx, x| {
                if *x == 3 { panic!("bad partition") }
                *x
            });
            let total = tree_reduce(&mapped, |x, y| x + y).unwrap();
            match total.run(&ctx) {
                Err(EngineError::StageFailed { stage, attempts, cause }) => {
                    assert_eq!(stage, "Apply");
                    assert_eq!(attempts, 2);
                    assert!(cause.contains("bad partition"));
                },
                other => panic!("expected stage failure, got {:?}", other)
            }
        }
    }
}
