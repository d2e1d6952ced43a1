use std::marker::PhantomData;
use std::sync::Arc;
use std::any::Any;

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::task::{DynFn,DynFn2,DynTryFn,BASS};
use crate::graph::*;

struct Lift<A>(A);

impl <A: Any + Send + Sync + Clone> Input for Lift<A> {
    fn read(&self) -> BASS {
        Box::new(self.0.clone())
    }
}

/// A value that will be produced once the graph behind it is run.
#[derive(Clone)]
pub struct Deferred<A> {
    graph: Graph,
    items: PhantomData<A>,
    handle: Arc<Handle>
}

impl <A: Any + Send + Sync> Deferred<A> {

    fn derive<B>(graph: Graph, handle: Arc<Handle>) -> Deferred<B> {
        Deferred { graph, items: PhantomData, handle }
    }

    /// Stage name of the task producing this value
    pub fn stage(&self) -> &str {
        self.handle.name()
    }

    #[cfg(test)]
    pub(crate) fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Applies a function to the value, producing a new Deferred
    pub fn apply<B: Any + Send + Sync, F: Send + Sync + 'static + Fn(&A) -> B>(&self, f: F) -> Deferred<B> {
        self.apply_named("Apply", f)
    }

    /// Same as `apply`, registering the task under the provided stage name
    pub fn apply_named<B: Any + Send + Sync, F: Send + Sync + 'static + Fn(&A) -> B>(&self, name: &str, f: F) -> Deferred<B> {
        let mut ng = self.graph.clone();
        let handle = ng.add_task(FnArgs::Single(self.handle.clone()), DynFn::new(f), name);
        Deferred::<A>::derive(ng, handle)
    }

    /// Applies a function that can fail.  A failed evaluation is retried by the scheduler up
    /// to the context's attempt limit before the job aborts.
    pub fn try_apply<
        B: Any + Send + Sync,
        F: Send + Sync + 'static + Fn(&A) -> Result<B, String>
    >(&self, name: &str, f: F) -> Deferred<B> {
        let mut ng = self.graph.clone();
        let handle = ng.add_task(FnArgs::Single(self.handle.clone()), DynTryFn::new(f), name);
        Deferred::<A>::derive(ng, handle)
    }

    /// Combines two Deferred values with a joiner function
    pub fn join<B: Any + Send + Sync, C: Any + Send + Sync, F: Send + Sync + 'static + Fn(&A, &B) -> C>(&self, other: &Deferred<B>, f: F) -> Deferred<C> {
        let mut ng = self.graph.merge(&other.graph);
        let handle = ng.add_task(
            FnArgs::Join(self.handle.clone(), other.handle.clone()),
            DynFn2::new(f), "Join");
        Deferred::<A>::derive(ng, handle)
    }
}

impl <A: Any + Send + Sync + Clone> Deferred<A> {

    /// Lifts a concrete value into a Deferred
    pub fn lift(a: A, name: Option<&str>) -> Self {
        let mut graph = Graph::new();
        let handle = graph.add_input(Lift(a), name.unwrap_or("Input"));
        Deferred {
            graph,
            items: PhantomData,
            handle
        }
    }

    /// Runs the graph on the context's scheduler and returns the computed value
    pub fn run(&self, ctx: &ExecutionContext) -> Result<A, EngineError> {
        let graph = Arc::new(self.graph.clone());
        let mut outputs = ctx.compute(graph, &[self.handle.clone()])?;
        let out = outputs.pop().ok_or_else(|| EngineError::MissingOutput {
            stage: self.handle.name().to_owned()
        })?;
        (**out).downcast_ref::<A>().cloned().ok_or_else(|| EngineError::TypeMismatch {
            stage: self.handle.name().to_owned()
        })
    }
}

/// Applies `f` to every Deferred, passing along the partition index
pub fn batch_apply<
    A: Any + Send + Sync + Clone,
    B: Any + Send + Sync,
    F: 'static + Sync + Send + Clone + Fn(usize, &A) -> B
    >(defs: &[Deferred<A>], f: F)
-> Vec<Deferred<B>> {
    defs.iter().enumerate().map(|(idx, p)| {
        let mf = f.clone();
        p.apply(move |vs| mf(idx, vs))
    }).collect()
}

/// Fallible version of `batch_apply`; every task is registered under `name`
pub fn batch_try_apply<
    A: Any + Send + Sync + Clone,
    B: Any + Send + Sync,
    F: 'static + Sync + Send + Clone + Fn(usize, &A) -> Result<B, String>
    >(defs: &[Deferred<A>], name: &str, f: F)
-> Vec<Deferred<B>> {
    defs.iter().enumerate().map(|(idx, p)| {
        let mf = f.clone();
        p.try_apply(name, move |vs| mf(idx, vs))
    }).collect()
}

/// Pairwise combines Deferreds until a single one is left
pub fn tree_reduce<A: Any + Send + Sync + Clone,
                   F: 'static + Sync + Send + Clone + Fn(&A, &A) -> A
>(
    defs: &[Deferred<A>],
    f: F
) -> Option<Deferred<A>> {
    tree_reduce_until(defs, 1, f).map(|mut defs| {
        defs.remove(0)
    })
}

/// Pairwise combines Deferreds until `parts` or fewer remain
pub fn tree_reduce_until<A: Any + Send + Sync + Clone,
                   F: 'static + Sync + Send + Clone + Fn(&A, &A) -> A
>(
    defs: &[Deferred<A>],
    parts: usize,
    f: F
) -> Option<Vec<Deferred<A>>> {
    if defs.is_empty() {
        None
    } else if defs.len() <= parts.max(1) {
        Some(defs.to_vec())
    } else {
        let mut pass: Vec<_> = defs.chunks(2).map(|pair| {
            match pair {
                [l, r] => l.join(r, f.clone()),
                _ => pair[0].clone()
            }
        }).collect();
        pass.shrink_to_fit();
        tree_reduce_until(&pass, parts, f)
    }
}
