use lexflow::deferred::Deferred;
use lexflow_collection::collection::memory::MemoryCollection;
use serde::Serialize;

use crate::text;

/// How often a normalized word occurs in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64
}

impl WordCount {
    pub fn new<S: Into<String>>(word: S, count: u64) -> Self {
        WordCount { word: word.into(), count }
    }
}

/// Number of records in the corpus, blank and malformed ones included
pub fn count_sentences(corpus: &MemoryCollection<String>) -> Deferred<u64> {
    corpus.count().apply_named("CountSentences", |n| *n as u64)
}

/// Number of non-empty normalized words across the corpus
pub fn count_words(corpus: &MemoryCollection<String>) -> Deferred<u64> {
    corpus.fold(0u64,
                |acc, sentence| *acc += text::words(sentence).count() as u64,
                |x, y| x + y)
}

/// Every normalized word of the corpus, one item per occurrence
pub fn words(corpus: &MemoryCollection<String>) -> MemoryCollection<String> {
    corpus.emit(|sentence, emitter| {
        for word in text::words(sentence) {
            emitter(word);
        }
    })
}

/// Occurrence count of every distinct normalized word, spread over `partitions`
/// partitions by word
pub fn compute_counts(corpus: &MemoryCollection<String>, partitions: usize) -> MemoryCollection<WordCount> {
    words(corpus)
        .frequencies(partitions)
        .map(|(word, count)| WordCount::new(word.clone(), *count as u64))
}

/// Sum of the counts in a word-count collection
pub fn total_occurrences(counts: &MemoryCollection<WordCount>) -> Deferred<u64> {
    counts.fold(0u64, |acc, wc| *acc += wc.count, |x, y| x + y)
}

#[cfg(test)]
mod counts_test {
    use super::*;
    use lexflow::ExecutionContext;
    use crate::source::corpus_from_sentences;

    fn contexts() -> Vec<ExecutionContext> {
        vec![ExecutionContext::leveled(), ExecutionContext::greedy(4)]
    }

    fn corpus(n: usize) -> MemoryCollection<String> {
        corpus_from_sentences(vec![
            "The cat sat on the mat.",
            "",
            "It was happy!  The END",
            "-- 42 --",
            "Cat's cats, CATS."
        ], n)
    }

    #[test]
    fn test_count_sentences() {
        for ctx in contexts() {
            assert_eq!(count_sentences(&corpus(3)).run(&ctx), Ok(5));
            assert_eq!(count_sentences(&corpus_from_sentences(Vec::<String>::new(), 3)).run(&ctx), Ok(0));
        }
    }

    #[test]
    fn test_count_words() {
        for ctx in contexts() {
            assert_eq!(count_words(&corpus(2)).run(&ctx), Ok(14));
        }
    }

    #[test]
    fn test_compute_counts() {
        let counts = compute_counts(&corpus(2), 3).coalesce().sort_by(|wc| wc.word.clone());
        let expected = vec![
            WordCount::new("cat", 1),
            WordCount::new("cat's", 1),
            WordCount::new("cats", 2),
            WordCount::new("end", 1),
            WordCount::new("happy", 1),
            WordCount::new("it", 1),
            WordCount::new("mat", 1),
            WordCount::new("on", 1),
            WordCount::new("sat", 1),
            WordCount::new("the", 3),
            WordCount::new("was", 1)
        ];
        for ctx in contexts() {
            assert_eq!(counts.run(&ctx), Ok(expected.clone()));
        }
    }

    #[test]
    fn test_counts_are_conserved_for_any_partitioning() {
        let ctx = ExecutionContext::greedy(4);
        for n in [1, 2, 3, 7, 20].iter() {
            let c = corpus(*n);
            let counts = compute_counts(&c, *n);
            assert_eq!(total_occurrences(&counts).run(&ctx), count_words(&c).run(&ctx));

            let words = counts.run(&ctx).unwrap();
            let mut distinct: Vec<_> = words.iter().map(|wc| wc.word.clone()).collect();
            distinct.sort();
            distinct.dedup();
            assert_eq!(distinct.len(), words.len());
            assert!(words.iter().all(|wc| wc.count > 0 && !wc.word.is_empty()));
        }
    }

    #[test]
    fn test_counts_of_empty_corpus() {
        let c = corpus_from_sentences(vec!["", "!!! ..."], 4);
        let ctx = ExecutionContext::leveled();
        assert_eq!(compute_counts(&c, 4).run(&ctx), Ok(vec![]));
        assert_eq!(count_words(&c).run(&ctx), Ok(0));
        assert_eq!(count_sentences(&c).run(&ctx), Ok(2));
    }
}
