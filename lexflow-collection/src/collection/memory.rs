//! MemoryCollection
//! ---
//! MemoryCollection provides a variety of dataflow operators for consuming and transforming
//! data.  Every partition is a `Deferred<Vec<A>>`; nothing runs until the collection, or a
//! value derived from it, is run on an `ExecutionContext`.
//!

use std::any::Any;
use std::hash::Hash;

use lexflow::deferred::{Deferred, batch_apply, tree_reduce};
use lexflow::{EngineError, ExecutionContext};

use crate::partitioned::{partition, partition_by_key, fold_by, concat};
use super::emit;

/// MemoryCollection struct
#[derive(Clone)]
pub struct MemoryCollection<A>  {
    partitions: Vec<Deferred<Vec<A>>>
}

impl <A: Any + Send + Sync + Clone> MemoryCollection<A> {

    /// Creates a MemoryCollection from a set of Deferred objects.
    pub fn from_defs(vs: Vec<Deferred<Vec<A>>>) -> MemoryCollection<A> {
        MemoryCollection {
            partitions: vs
        }
    }

    /// Provides raw access to the underlying Deferred objects
    pub fn to_defs(&self) -> &[Deferred<Vec<A>>] {
        &self.partitions
    }

    /// Creates a new MemoryCollection holding a Vec of items in a single partition
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::from_vec(vec![1,2,3usize]);
    ///   assert_eq!(col.run(&ExecutionContext::leveled()), Ok(vec![1,2,3usize]));
    /// ```
    pub fn from_vec(vs: Vec<A>) -> MemoryCollection<A> {
        MemoryCollection {
            partitions: vec![Deferred::lift(vs, None)],
        }
    }

    /// Splits a Vec into `n` contiguous partitions whose sizes differ by at most one.  Fewer
    /// partitions are created when there are fewer than `n` items, so none is empty.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![1,2,3,4,5usize], 2);
    ///   assert_eq!(col.n_partitions(), 2);
    ///   assert_eq!(col.run(&ExecutionContext::leveled()), Ok(vec![1,2,3,4,5]));
    /// ```
    pub fn parallelize(vs: Vec<A>, n: usize) -> MemoryCollection<A> {
        if vs.is_empty() {
            return MemoryCollection { partitions: Vec::new() };
        }
        let n = n.clamp(1, vs.len());
        let (base, extra) = (vs.len() / n, vs.len() % n);
        let mut partitions = Vec::with_capacity(n);
        let mut start = 0;
        for i in 0..n {
            let end = start + base + usize::from(i < extra);
            partitions.push(Deferred::lift(vs[start..end].to_vec(), Some("Parallelize")));
            start = end;
        }
        MemoryCollection { partitions }
    }

    /// Returns the current number of data partitions
    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Concatenates two collections into a single Collection
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let one = MemoryCollection::from_vec(vec![1,2,3usize]);
    ///   let two = MemoryCollection::from_vec(vec![4usize, 5, 6]);
    ///   let cat = one.concat(&two);
    ///   assert_eq!(cat.run(&ExecutionContext::leveled()), Ok(vec![1,2,3,4,5,6]));
    /// ```
    pub fn concat(&self, other: &MemoryCollection<A>) -> MemoryCollection<A> {
        let mut nps = self.partitions.clone();
        nps.extend(other.partitions.iter().cloned());
        MemoryCollection { partitions: nps }
    }

    /// Maps a function over the values in the collection, returning a new collection
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let one = MemoryCollection::from_vec(vec![1,2,3usize]);
    ///   let strings = one.map(|i| format!("{}", i));
    ///   assert_eq!(strings.run(&ExecutionContext::leveled()),
    ///     Ok(vec!["1".into(),"2".into(),"3".into()]));
    /// ```
    pub fn map<
        B: Any + Send + Sync + Clone,
        F: 'static + Sync + Send + Clone + Fn(&A) -> B
    >(&self, f: F) -> MemoryCollection<B> {
        self.emit(move |x, emitter| {
            emitter(f(x))
        })
    }

    /// Filters out items in the collection that fail the predicate.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::from_vec(vec![1,2,3usize]);
    ///   let odds = col.filter(|x| x % 2 == 1);
    ///   assert_eq!(odds.run(&ExecutionContext::leveled()), Ok(vec![1, 3usize]));
    /// ```
    pub fn filter<
        F: 'static + Sync + Send + Clone + Fn(&A) -> bool
    >(&self, f: F) -> MemoryCollection<A> {
        self.emit(move |x, emitter| {
            if f(x) {
                emitter(x.clone())
            }
        })
    }

    /// Re-partitions a collection by the number of provided chunks.  It uniformly distributes
    /// data from each old partition into each new partition.
    pub fn split(&self, n_chunks: usize) -> MemoryCollection<A> {
        self.partition(n_chunks, |idx, _k| idx)
    }

    /// Collapses every partition into one.  Needed before a global sort.
    pub fn coalesce(&self) -> MemoryCollection<A> {
        MemoryCollection { partitions: concat(&self.partitions).into_iter().collect() }
    }

    /// Maps over all items in a collection, optionally emitting new values.  It can be used
    /// to fuse a number of map/filter/flat_map functions into a single stage.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::from_vec(vec!["a b".to_owned(), "c".to_owned()]);
    ///   let words = col.emit(|line, emitter| {
    ///     for w in line.split_whitespace() {
    ///         emitter(w.to_owned());
    ///     }
    ///   });
    ///   assert_eq!(words.run(&ExecutionContext::leveled()),
    ///     Ok(vec!["a".into(), "b".into(), "c".into()]));
    /// ```
    pub fn emit<
        B: Any + Send + Sync + Clone,
        F: 'static + Sync + Send + Clone + Fn(&A, &mut dyn FnMut(B))
    >(&self, f: F) -> MemoryCollection<B> {
        MemoryCollection { partitions: emit(&self.partitions, f) }
    }

    /// Re-partitions data into N new partitions by the given function.  The user provided
    /// function is used as a hash function, mapping the returned value to a partition index.
    pub fn partition<
        F: 'static + Sync + Send + Clone + Fn(usize, &A) -> usize
    >(&self, partitions: usize, f: F) -> MemoryCollection<A> {
        MemoryCollection { partitions: partition(&self.partitions, partitions, f) }
    }

    /// Folds and accumulates values across multiple partitions into K new partitions.
    /// This is also known as a "group by" with a following reducer.
    ///
    /// MemoryCollection first performs a block aggregation: that is, it combines values
    /// within each partition first using the `binop` function.  It then hashes
    /// each key to a new partition index, where it will then aggregate all keys using the
    /// `reduce` function.
    ///
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::from_vec(vec![1,2,3,4,5usize]);
    ///   // Sum all odds and evens together
    ///   let group_sum = col.fold_by(|x| x % 2,
    ///                               || 0usize,
    ///                               |block_acc, item| {*block_acc += *item},
    ///                               |part_acc1, part_acc2| {*part_acc1 += *part_acc2},
    ///                               1)
    ///                   .sort_by(|x| x.0);
    ///
    ///   assert_eq!(group_sum.n_partitions(), 1);
    ///   assert_eq!(group_sum.run(&ExecutionContext::leveled()), Ok(vec![(0, 6), (1, 9)]));
    /// ```
    pub fn fold_by<K: Any + Sync + Send + Clone + Hash + Eq,
                   B: Any + Sync + Send + Clone,
                   D: 'static + Sync + Send + Clone + Fn() -> B,
                   F: 'static + Sync + Send + Clone + Fn(&A) -> K,
                   O: 'static + Sync + Send + Clone + Fn(&mut B, &A),
                   R: 'static + Sync + Send + Clone + Fn(&mut B, &B)>(
        &self, key: F, default: D, binop: O, reduce: R, partitions: usize
    ) -> MemoryCollection<(K,B)> {
        let results = fold_by(&self.partitions, key, default, binop, reduce, partitions);
        MemoryCollection { partitions: results }
    }

    /// Simple function to re-partition values by a given key.  The return key is hashed
    /// and moduloed by the new partition count to determine where it will end up.
    pub fn partition_by_key<
        K: Any + Sync + Send + Clone + Hash + Eq,
        F: 'static + Sync + Send + Clone + Fn(&A) -> K
    >(&self, n_chunks: usize, key: F) -> MemoryCollection<A> {
        let groups = partition_by_key(&self.partitions, n_chunks, key).iter()
            .filter_map(|part| concat(part))
            .collect();
        MemoryCollection { partitions: groups }
    }

    /// Sorts values within each partition by a key function.  If a global sort is desired,
    /// the collection needs to be coalesced into a single partition first.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![3,1,4,2i32], 2);
    ///   let sorted = col.coalesce().sort_by(|x| -*x);
    ///
    ///   assert_eq!(sorted.run(&ExecutionContext::leveled()), Ok(vec![4, 3, 2, 1]));
    /// ```
    pub fn sort_by<
        K: Ord,
        F: 'static + Sync + Send + Clone + Fn(&A) -> K
    >(&self, key: F) -> MemoryCollection<A> {
        let nps = batch_apply(&self.partitions, move |_idx, vs| {
            let mut v2: Vec<_> = vs.clone();
            v2.sort_by_key(|v| key(v));
            v2
        });
        MemoryCollection { partitions: nps }
    }

    /// Returns the `n` smallest items by `key` in a single partition, ascending.  Each
    /// partition is trimmed to its own `n` smallest before anything is merged.
    /// ```rust
    ///   use std::cmp::Reverse;
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![5,1,4,2,3usize], 3);
    ///   let top = col.take_ordered(2, |x| Reverse(*x));
    ///   assert_eq!(top.run(&ExecutionContext::leveled()), Ok(vec![5, 4]));
    /// ```
    pub fn take_ordered<
        K: Ord,
        F: 'static + Sync + Send + Clone + Fn(&A) -> K
    >(&self, n: usize, key: F) -> MemoryCollection<A> {
        let k2 = key.clone();
        let smallest = move |vs: &[A]| {
            let mut v2 = vs.to_vec();
            v2.sort_by(|a, b| k2(a).cmp(&k2(b)));
            v2.truncate(n);
            v2
        };
        let s2 = smallest.clone();
        let local = batch_apply(&self.partitions, move |_idx, vs: &Vec<A>| smallest(vs.as_slice()));
        let merged = tree_reduce(&local, move |x, y| {
            let mut both = x.clone();
            both.extend_from_slice(y);
            s2(both.as_slice())
        });
        MemoryCollection { partitions: merged.into_iter().collect() }
    }

    /// Folds every partition into a value starting from `zero`, then combines the
    /// per-partition values with `combine`.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec!["a b", "c"], 2);
    ///   let words = col.fold(0usize, |acc, line| *acc += line.split_whitespace().count(),
    ///                        |x, y| x + y);
    ///   assert_eq!(words.run(&ExecutionContext::leveled()), Ok(3));
    /// ```
    pub fn fold<
        B: Any + Send + Sync + Clone,
        O: 'static + Sync + Send + Clone + Fn(&mut B, &A),
        C: 'static + Sync + Send + Clone + Fn(&B, &B) -> B
    >(&self, zero: B, fold: O, combine: C) -> Deferred<B> {
        let z = zero.clone();
        let parts = batch_apply(&self.partitions, move |_idx, vs| {
            let mut acc = z.clone();
            for v in vs {
                fold(&mut acc, v);
            }
            acc
        });
        tree_reduce(&parts, combine)
            .unwrap_or_else(|| Deferred::lift(zero, Some("EmptyFold")))
    }

    /// Reduces all items with an associative, commutative function.  None if the
    /// collection is empty.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![3, 9, 4usize], 3);
    ///   assert_eq!(col.reduce(|x, y| *x.max(y)).run(&ExecutionContext::leveled()), Ok(Some(9)));
    /// ```
    pub fn reduce<
        F: 'static + Sync + Send + Clone + Fn(&A, &A) -> A
    >(&self, f: F) -> Deferred<Option<A>> {
        let g = f.clone();
        self.fold(None,
                  move |acc: &mut Option<A>, v| {
                      *acc = Some(match acc.take() {
                          Some(a) => g(&a, v),
                          None => v.clone()
                      })
                  },
                  move |l, r| match (l, r) {
                      (Some(a), Some(b)) => Some(f(a, b)),
                      (Some(a), None) | (None, Some(a)) => Some(a.clone()),
                      (None, None) => None
                  })
    }

    /// Returns the number of items in the collection.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![1usize, 2, 3, 4], 3);
    ///   assert_eq!(col.count().run(&ExecutionContext::leveled()), Ok(4));
    /// ```
    pub fn count(&self) -> Deferred<usize> {
        let nps = batch_apply(&self.partitions, |_idx, vs| vs.len());
        tree_reduce(&nps, |x, y| x + y)
            .unwrap_or_else(|| Deferred::lift(0usize, Some("EmptyCount")))
    }

    /// Executes the Collection, returning every item
    pub fn run(&self, ctx: &ExecutionContext) -> Result<Vec<A>, EngineError> {
        match concat(&self.partitions) {
            Some(cat) => cat.run(ctx),
            None => Ok(Vec::new())
        }
    }

    /// Executes the Collection, returning items grouped by partition
    pub fn run_partitions(&self, ctx: &ExecutionContext) -> Result<Vec<Vec<A>>, EngineError> {
        let wrapped: Vec<_> = self.partitions.iter()
            .map(|p| p.apply(|vs| vec![vs.clone()]))
            .collect();
        match concat(&wrapped) {
            Some(cat) => cat.run(ctx),
            None => Ok(Vec::new())
        }
    }
}

impl <K: Any + Send + Sync + Clone + Hash + Eq, V: Any + Send + Sync + Clone> MemoryCollection<(K, V)> {

    /// Reduces the values of each key with `reduce` into `partitions` output partitions.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::parallelize(vec![("a", 1), ("b", 2), ("a", 3)], 2);
    ///   let sums = col.group_reduce(|x, y| x + y, 2).coalesce().sort_by(|kv| kv.0);
    ///   assert_eq!(sums.run(&ExecutionContext::leveled()), Ok(vec![("a", 4), ("b", 2)]));
    /// ```
    pub fn group_reduce<
        R: 'static + Sync + Send + Clone + Fn(&V, &V) -> V
    >(&self, reduce: R, partitions: usize) -> MemoryCollection<(K, V)> {
        let r2 = reduce.clone();
        self.fold_by(|kv| kv.0.clone(),
                     || None,
                     move |acc: &mut Option<V>, kv| {
                         *acc = Some(match acc.take() {
                             Some(a) => reduce(&a, &kv.1),
                             None => kv.1.clone()
                         })
                     },
                     move |acc, other| {
                         if let Some(o) = other {
                             *acc = Some(match acc.take() {
                                 Some(a) => r2(&a, o),
                                 None => o.clone()
                             })
                         }
                     },
                     partitions)
            .emit(|(k, v), emitter| {
                if let Some(v) = v {
                    emitter((k.clone(), v.clone()))
                }
            })
    }
}

impl <A: Any + Send + Sync + Clone + Hash + Eq> MemoryCollection<A> {

    /// Computes the frequencies of the items in collection.
    /// ```rust
    ///   use lexflow::ExecutionContext;
    ///   use lexflow_collection::collection::memory::MemoryCollection;
    ///
    ///   let col = MemoryCollection::from_vec(vec![1, 2, 1, 5, 1, 2]);
    ///   let freqs = col.frequencies(1).sort_by(|x| x.0);
    ///   assert_eq!(freqs.run(&ExecutionContext::leveled()), Ok(vec![(1, 3), (2, 2), (5, 1)]));
    /// ```
    pub fn frequencies(&self, partitions: usize) -> MemoryCollection<(A, usize)> {
        self.fold_by(|s| s.clone(),
                     || 0usize,
                     |acc, _l| *acc += 1,
                     |x, y| *x += *y,
                     partitions)
    }
}

#[cfg(test)]
mod test_lib {
    use super::*;

    fn contexts() -> Vec<ExecutionContext> {
        vec![ExecutionContext::leveled(), ExecutionContext::greedy(4)]
    }

    #[test]
    fn test_fold_by() {
        let col = MemoryCollection::from_vec(vec![1,2,3,1,2usize]);
        let out = col.fold_by(|x| *x, || 0, |x, _y| *x += 1, |x, y| *x += y, 1);
        for ctx in contexts() {
            let mut results = out.run(&ctx).unwrap();
            results.sort();
            assert_eq!(results, vec![(1, 2), (2, 2), (3, 1)]);
        }
    }

    #[test]
    fn test_fold_by_parts() {
        let col = MemoryCollection::parallelize(vec![1,2,3,1,2usize], 3);
        let out = col.fold_by(|x| *x, || 0, |x, _y| *x += 1, |x, y| *x += y, 2);
        assert_eq!(out.n_partitions(), 2);
        let mut results = out.run(&ExecutionContext::leveled()).unwrap();
        results.sort();
        assert_eq!(results, vec![(1, 2), (2, 2), (3, 1)]);
    }

    #[test]
    fn test_fold_by_keys_land_in_one_partition() {
        let col = MemoryCollection::parallelize((0..100usize).map(|x| x % 7).collect(), 5);
        let parts = col.frequencies(3).run_partitions(&ExecutionContext::leveled()).unwrap();
        assert_eq!(parts.len(), 3);
        let mut keys: Vec<_> = parts.iter().flatten().map(|kv| kv.0).collect();
        keys.sort();
        assert_eq!(keys, (0..7usize).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_by_key() {
        let col = MemoryCollection::from_vec(vec![1,2,3,1,2usize]);
        let computed = col.partition_by_key(2, |x| *x);
        assert_eq!(computed.n_partitions(), 2);
        let parts = computed.run_partitions(&ExecutionContext::leveled()).unwrap();
        for x in 1..=3usize {
            assert_eq!(parts.iter().filter(|p| p.contains(&x)).count(), 1);
        }
        assert_eq!(parts.iter().map(|p| p.len()).sum::<usize>(), 5);
    }

    #[test]
    fn test_partition() {
        let col = MemoryCollection::from_vec(vec![1,2,3,1,2usize]);
        let computed = col.partition(2, |_idx, x| x % 2)
            .sort_by(|x| *x);
        assert_eq!(computed.n_partitions(), 2);
        let results = computed.run(&ExecutionContext::leveled()).unwrap();
        assert_eq!(results, vec![2, 2, 1, 1, 3]);
    }

    #[test]
    fn test_parallelize_sizes() {
        let col = MemoryCollection::parallelize((0..10usize).collect(), 4);
        assert_eq!(col.n_partitions(), 4);
        let parts = col.run_partitions(&ExecutionContext::leveled()).unwrap();
        assert_eq!(parts, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7], vec![8, 9]]);

        let empty: MemoryCollection<usize> = MemoryCollection::parallelize(Vec::new(), 4);
        assert_eq!(empty.n_partitions(), 0);
        assert_eq!(empty.run(&ExecutionContext::leveled()), Ok(Vec::new()));
        assert_eq!(empty.count().run(&ExecutionContext::leveled()), Ok(0));
    }

    #[test]
    fn test_count() {
        let col = MemoryCollection::from_vec(vec![1,2,3,1,2usize]);
        for ctx in contexts() {
            assert_eq!(col.split(3).count().run(&ctx), Ok(5));
        }
    }

    #[test]
    fn test_emit() {
        let results = MemoryCollection::from_vec(vec![1,2,3usize])
            .emit(|num, emitter| {
                for i in 0..*num {
                    emitter(i);
                }
            })
            .sort_by(|x| *x)
            .run(&ExecutionContext::leveled()).unwrap();
        assert_eq!(results, vec![0, 0, 0, 1, 1, 2]);
    }

    #[test]
    fn test_sort() {
        let results = MemoryCollection::from_vec(vec![1, 3, 2usize])
            .sort_by(|x| *x)
            .run(&ExecutionContext::leveled()).unwrap();
        assert_eq!(results, vec![1, 2, 3]);
    }

    #[test]
    fn test_reduce_empty() {
        let col: MemoryCollection<usize> = MemoryCollection::from_defs(Vec::new());
        assert_eq!(col.reduce(|x, y| x + y).run(&ExecutionContext::leveled()), Ok(None));
    }

    #[test]
    fn test_group_reduce_matches_any_partitioning() {
        let pairs: Vec<(usize, u64)> = (0..200usize).map(|i| (i % 11, i as u64)).collect();
        let mut expected = vec![0u64; 11];
        for (k, v) in pairs.iter() {
            expected[*k] += v;
        }
        for n in [1usize, 2, 5, 13] {
            let col = MemoryCollection::parallelize(pairs.clone(), n);
            let mut out = col.group_reduce(|x, y| x + y, 3).run(&ExecutionContext::greedy(4)).unwrap();
            out.sort();
            let got: Vec<u64> = out.into_iter().map(|kv| kv.1).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_take_ordered_with_ties() {
        let col = MemoryCollection::parallelize(vec![("b", 2), ("a", 2), ("c", 5), ("d", 1)], 3);
        let top = col.take_ordered(3, |kv| (std::cmp::Reverse(kv.1), kv.0));
        assert_eq!(top.run(&ExecutionContext::leveled()), Ok(vec![("c", 5), ("a", 2), ("b", 2)]));
    }
}
