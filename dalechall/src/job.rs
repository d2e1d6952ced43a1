use std::cmp::Reverse;
use std::fmt;
use std::io;
use std::sync::Arc;

use clap::ValueEnum;
use lexflow::ExecutionContext;
use lexflow_collection::collection::memory::MemoryCollection;

use crate::classify::{difficult_occurrences, difficult_words};
use crate::counts::{compute_counts, count_sentences, count_words};
use crate::error::AnalysisError;
use crate::lexicon::Lexicon;
use crate::report::Report;
use crate::score::{dale_chall_score, CorpusTotals};

/// Number of words reported by TOP20
pub const TOP_N: usize = 20;

/// What a job computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Mode {
    /// Count sentences
    #[value(name = "SEN")]
    Sen,
    /// Count words
    #[value(name = "WRD")]
    Wrd,
    /// List every distinct word with its count, least frequent first
    #[value(name = "UNQ")]
    Unq,
    /// The twenty most frequent words
    #[value(name = "TOP20")]
    Top20,
    /// Count occurrences of difficult words
    #[value(name = "DFF")]
    Dff,
    /// List difficult words with their counts
    #[value(name = "DFFP")]
    Dffp,
    /// Dale-Chall readability score
    #[value(name = "DCF")]
    Dcf
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sen => "SEN",
            Mode::Wrd => "WRD",
            Mode::Unq => "UNQ",
            Mode::Top20 => "TOP20",
            Mode::Dff => "DFF",
            Mode::Dffp => "DFFP",
            Mode::Dcf => "DCF"
        }
    }

    /// True for the modes that classify words against the easy-word list
    pub fn needs_lexicon(&self) -> bool {
        matches!(self, Mode::Dff | Mode::Dffp | Mode::Dcf)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn require(lexicon: &Option<Arc<Lexicon>>) -> Result<&Arc<Lexicon>, AnalysisError> {
    lexicon.as_ref().ok_or_else(|| AnalysisError::MissingLexiconSource {
        path: "<none>".into(),
        source: io::Error::new(io::ErrorKind::NotFound, "no lexicon was loaded")
    })
}

/// Builds the dataflow for `mode` over `corpus` and runs it on `ctx`.  Word counts are
/// spread over `partitions` partitions.  Lexicon modes without a lexicon fail with
/// `MissingLexiconSource`.
pub fn run_job(
    ctx: &ExecutionContext,
    corpus: &MemoryCollection<String>,
    mode: Mode,
    partitions: usize,
    lexicon: Option<Arc<Lexicon>>
) -> Result<Report, AnalysisError> {
    info!("Running {} over {} corpus partition(s)", mode, corpus.n_partitions());
    let partitions = partitions.max(1);

    let report = match mode {
        Mode::Sen => {
            let count = count_sentences(corpus).run(ctx)
                .map_err(AnalysisError::stage("count sentences"))?;
            Report::Sentences { count }
        },
        Mode::Wrd => {
            let count = count_words(corpus).run(ctx)
                .map_err(AnalysisError::stage("count words"))?;
            Report::Words { count }
        },
        Mode::Unq => {
            let counts = compute_counts(corpus, partitions)
                .coalesce()
                .sort_by(|wc| (wc.count, wc.word.clone()))
                .run(ctx)
                .map_err(AnalysisError::stage("compute counts"))?;
            Report::Unique { distinct: counts.len(), counts }
        },
        Mode::Top20 => {
            let counts = compute_counts(corpus, partitions)
                .take_ordered(TOP_N, |wc| (Reverse(wc.count), wc.word.clone()))
                .run(ctx)
                .map_err(AnalysisError::stage("rank words"))?;
            Report::Top { counts }
        },
        Mode::Dff => {
            let lex = require(&lexicon)?;
            let counts = compute_counts(corpus, partitions);
            let count = difficult_occurrences(&counts, lex).run(ctx)
                .map_err(AnalysisError::stage("classify words"))?;
            Report::Difficult { count }
        },
        Mode::Dffp => {
            let lex = require(&lexicon)?;
            let counts = difficult_words(&compute_counts(corpus, partitions), lex)
                .coalesce()
                .sort_by(|wc| (Reverse(wc.count), wc.word.clone()))
                .run(ctx)
                .map_err(AnalysisError::stage("classify words"))?;
            Report::DifficultWords { counts }
        },
        Mode::Dcf => {
            let lex = require(&lexicon)?;
            let counts = compute_counts(corpus, partitions);
            let totals = difficult_occurrences(&counts, lex)
                .join(&count_words(corpus), |d, w| (*d, *w))
                .join(&count_sentences(corpus), |(difficult, words), sentences| CorpusTotals {
                    difficult: *difficult,
                    words: *words,
                    sentences: *sentences
                })
                .run(ctx)
                .map_err(AnalysisError::stage("score corpus"))?;
            debug!("Corpus totals: {:?}", totals);
            let score = dale_chall_score(&totals)?;
            Report::Score { score, totals }
        }
    };
    Ok(report)
}
