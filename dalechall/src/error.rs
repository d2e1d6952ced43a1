use std::io;

use lexflow::EngineError;
use thiserror::Error;

/// Everything that can stop an analysis job, plus the one record-level problem that
/// doesn't.
#[derive(Debug, Error)]
pub enum AnalysisError {

    /// The score needs at least one word and one sentence
    #[error("cannot score a corpus of {words} word(s) in {sentences} sentence(s)")]
    EmptyCorpus { words: u64, sentences: u64 },

    /// The easy-word list could not be read
    #[error("lexicon source `{path}` is unavailable")]
    MissingLexiconSource {
        path: String,
        #[source]
        source: io::Error
    },

    /// A corpus line that could not be decoded.  Readers log it and carry on with an
    /// empty sentence instead of failing the job.
    #[error("malformed record at byte {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    /// The corpus could not be opened
    #[error("corpus `{path}` could not be read")]
    Corpus {
        path: String,
        #[source]
        source: io::Error
    },

    /// A pipeline stage failed while running on the engine
    #[error("{stage} failed")]
    Stage {
        stage: &'static str,
        #[source]
        source: EngineError
    }
}

impl AnalysisError {
    /// Wraps an engine failure with the name of the pipeline stage that ran it
    pub fn stage(stage: &'static str) -> impl FnOnce(EngineError) -> AnalysisError {
        move |source| AnalysisError::Stage { stage, source }
    }
}
