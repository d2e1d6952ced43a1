//! Contains the partitioned in-memory collection

/// Defines MemoryCollection and assorted functions
pub mod memory;

use std::any::Any;

use lexflow::deferred::{Deferred, batch_apply};

fn emit<
    A: Any + Send + Sync + Clone,
    B: Any + Send + Sync + Clone,
    F: 'static + Sync + Send + Clone + Fn(&A, &mut dyn FnMut(B))
>(defs: &[Deferred<Vec<A>>], f: F) -> Vec<Deferred<Vec<B>>> {

    batch_apply(defs, move |_idx, vs| {
        let mut out = Vec::new();
        for v in vs {
            f(v, &mut |r| out.push(r));
        }
        out.shrink_to_fit();
        out
    })
}
