use serde::Serialize;

use crate::error::AnalysisError;

/// Weight of the percentage of difficult words
pub const DIFFICULT_WEIGHT: f64 = 0.1579;

/// Weight of the average sentence length
pub const SENTENCE_WEIGHT: f64 = 0.0496;

/// The three totals the score is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusTotals {
    pub difficult: u64,
    pub words: u64,
    pub sentences: u64
}

impl CorpusTotals {

    /// Difficult words per hundred words
    pub fn percent_difficult(&self) -> f64 {
        self.difficult as f64 / self.words as f64 * 100.0
    }

    /// Words per sentence
    pub fn average_sentence_length(&self) -> f64 {
        self.words as f64 / self.sentences as f64
    }
}

/// Dale-Chall readability score.  Both the word and the sentence totals must be positive.
/// ```rust
///   use dalechall::score::{dale_chall_score, CorpusTotals};
///
///   let totals = CorpusTotals { difficult: 1, words: 10, sentences: 2 };
///   let score = dale_chall_score(&totals).unwrap();
///   assert!((score - (0.1579 * 10.0 + 0.0496 * 5.0)).abs() < 1e-9);
/// ```
pub fn dale_chall_score(totals: &CorpusTotals) -> Result<f64, AnalysisError> {
    if totals.words == 0 || totals.sentences == 0 {
        return Err(AnalysisError::EmptyCorpus {
            words: totals.words,
            sentences: totals.sentences
        });
    }
    Ok(DIFFICULT_WEIGHT * totals.percent_difficult()
        + SENTENCE_WEIGHT * totals.average_sentence_length())
}
