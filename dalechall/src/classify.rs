use std::sync::Arc;

use lexflow::deferred::Deferred;
use lexflow_collection::collection::memory::MemoryCollection;

use crate::counts::{total_occurrences, WordCount};
use crate::lexicon::{DifficultyLabel, Lexicon};

/// Labels every counted word against the lexicon.  Each partition task holds a handle to
/// the same shared lexicon.
pub fn label_words(
    counts: &MemoryCollection<WordCount>,
    lexicon: &Arc<Lexicon>
) -> MemoryCollection<(WordCount, DifficultyLabel)> {
    let lexicon = lexicon.clone();
    counts.map(move |wc| (wc.clone(), lexicon.label(&wc.word)))
}

/// Counted words that are not on the easy-word list
pub fn difficult_words(
    counts: &MemoryCollection<WordCount>,
    lexicon: &Arc<Lexicon>
) -> MemoryCollection<WordCount> {
    label_words(counts, lexicon).emit(|(wc, label), emitter| {
        if *label == DifficultyLabel::Difficult {
            emitter(wc.clone())
        }
    })
}

/// Total occurrences of difficult words, counting repeats
pub fn difficult_occurrences(counts: &MemoryCollection<WordCount>, lexicon: &Arc<Lexicon>) -> Deferred<u64> {
    total_occurrences(&difficult_words(counts, lexicon))
}
