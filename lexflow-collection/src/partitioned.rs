use std::any::Any;
use std::hash::{Hasher,Hash};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;

use lexflow::deferred::{Deferred, batch_apply, tree_reduce};

/// Combines values within each partition by key.  This is the map-side combiner: it
/// shrinks every partition to one entry per key before anything is shuffled.
pub fn block_reduce<
    A: Any + Sync + Send + Clone,
    K: Any + Sync + Send + Clone + Hash + Eq,
    B,
    C: Any + Sync + Send + Clone,
    D: 'static + Sync + Send + Clone + Fn() -> B,
    F: 'static + Sync + Send + Clone + Fn(&A) -> K,
    O: 'static + Sync + Send + Clone + Fn(&mut B, &A),
    M: 'static + Sync + Send + Clone + Fn(HashMap<K,B>) -> C,
>(
    defs: &[Deferred<Vec<A>>],
    key: F,
    default: D,
    binop: O,
    map: M
) -> Vec<Deferred<C>> {
    batch_apply(defs, move |_idx, vs| {
        let mut reducer = HashMap::new();
        for v in vs {
            let e = reducer.entry(key(v)).or_insert_with(&default);
            binop(e, v);
        }
        map(reducer)
    })
}

/// Splits every partition into `partitions` buckets, returning for each bucket index the
/// pieces contributed by each original partition.
pub fn split_by_key<
    A: Any + Send + Sync + Clone,
    F: 'static + Sync + Send + Clone + Fn(usize, &A) -> usize
>(
    defs: &[Deferred<Vec<A>>],
    partitions: usize,
    hash_function: F
) -> Vec<Vec<Deferred<Vec<A>>>> {
    let partitions = partitions.max(1);

    let stage1 = batch_apply(defs, move |_idx, vs| {
        let mut parts = vec![Vec::new(); partitions];
        for (idx, x) in vs.iter().enumerate() {
            parts[hash_function(idx, x) % partitions].push(x.clone());
        }
        parts
    });

    (0..partitions).map(|idx| {
        stage1.iter()
            .map(|s| s.apply(move |parts: &Vec<Vec<A>>| parts[idx].clone()))
            .collect()
    }).collect()
}

/// Redistributes data into `partitions` new partitions using `key` as the hash
pub fn partition<
    A: Any + Send + Sync + Clone,
    F: 'static + Sync + Send + Clone + Fn(usize, &A) -> usize
>(
    defs: &[Deferred<Vec<A>>],
    partitions: usize,
    key: F
) -> Vec<Deferred<Vec<A>>> {
    split_by_key(defs, partitions, key).iter()
        .filter_map(|group| concat(group))
        .collect()
}

/// Hashes each item's key to pick its bucket
pub fn partition_by_key<
    A: Any + Sync + Send + Clone,
    K: Any + Sync + Send + Clone + Hash + Eq,
    F: 'static + Sync + Send + Clone + Fn(&A) -> K
>(
    defs: &[Deferred<Vec<A>>],
    n_chunks: usize,
    key: F
) -> Vec<Vec<Deferred<Vec<A>>>> {
    split_by_key(defs, n_chunks, move |_idx, v| {
        let mut hasher = DefaultHasher::new();
        key(v).hash(&mut hasher);
        hasher.finish() as usize
    })
}

fn merge_maps<
    K: Hash + Eq + Clone,
    V: Clone,
    R: Fn(&mut V, &V)
>(
    left: &HashMap<K, V>,
    right: &HashMap<K,V>,
    reduce: &R
) -> HashMap<K, V> {
    let mut merged = left.clone();
    for (k, v) in right.iter() {
        merged.entry(k.clone())
            .and_modify(|e| reduce(e, v))
            .or_insert_with(|| v.clone());
    }
    merged
}

/// Group-by with a reducer.  Values are first combined per partition with `binop`, the
/// partial results are hash-shuffled into `partitions` buckets, and each bucket is merged
/// with `reduce` as a tree.  `reduce` must be associative and commutative; the result is
/// then independent of how the input was partitioned.
pub fn fold_by<
    A: Any + Send + Sync + Clone,
    B: Any + Sync + Send + Clone,
    K: Any + Sync + Send + Clone + Hash + Eq,
    D: 'static + Sync + Send + Clone + Fn() -> B,
    F: 'static + Sync + Send + Clone + Fn(&A) -> K,
    O: 'static + Sync + Send + Clone + Fn(&mut B, &A),
    R: 'static + Sync + Send + Clone + Fn(&mut B, &B)
>(
    defs: &[Deferred<Vec<A>>],
    key: F,
    default: D,
    binop: O,
    reduce: R,
    partitions: usize
) -> Vec<Deferred<Vec<(K,B)>>> {

    let stage1 = block_reduce(defs, key, default, binop,
                              |x| x.into_iter().collect::<Vec<(K,B)>>());

    let chunks = partition_by_key(&stage1, partitions, |x: &(K, B)| x.0.clone());

    chunks.into_iter().map(|chunk| {
        let maps = batch_apply(&chunk, |_idx, vs: &Vec<(K, B)>| {
            vs.iter().cloned().collect::<HashMap<K,B>>()
        });
        let red = reduce.clone();
        let merged = tree_reduce(&maps, move |l, r| merge_maps(l, r, &red))
            .unwrap_or_else(|| Deferred::lift(HashMap::new(), Some("EmptyGroup")));

        merged.apply(|vs| vs.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Vec<(K,B)>>())
    }).collect()
}

/// Concatenates the partitions into one, or None if there are none
pub fn concat<A: Any + Sync + Send + Clone>(defs: &[Deferred<Vec<A>>]) -> Option<Deferred<Vec<A>>> {
    tree_reduce(defs, |x, y| {
        let mut v1 = Vec::with_capacity(x.len() + y.len());
        v1.extend_from_slice(x);
        v1.extend_from_slice(y);
        v1
    })
}
