use std::fmt::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use crate::counts::WordCount;
use crate::score::CorpusTotals;

/// Result of one job, by mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode")]
pub enum Report {
    #[serde(rename = "SEN")]
    Sentences { count: u64 },

    #[serde(rename = "WRD")]
    Words { count: u64 },

    /// Every distinct word, least frequent first
    #[serde(rename = "UNQ")]
    Unique { distinct: usize, counts: Vec<WordCount> },

    /// Most frequent words, most frequent first
    #[serde(rename = "TOP20")]
    Top { counts: Vec<WordCount> },

    #[serde(rename = "DFF")]
    Difficult { count: u64 },

    #[serde(rename = "DFFP")]
    DifficultWords { counts: Vec<WordCount> },

    #[serde(rename = "DCF")]
    Score { score: f64, totals: CorpusTotals }
}

/// How a report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    Text,
    /// A single JSON document
    Json
}

fn write_counts<W: Write>(out: &mut W, counts: &[WordCount]) -> fmt::Result {
    for wc in counts {
        writeln!(out, "{}: {}", wc.word, wc.count)?;
    }
    Ok(())
}

impl Report {

    /// Writes the report as text lines mentioning the corpus `input`
    pub fn write_text<W: Write>(&self, out: &mut W, input: &str) -> fmt::Result {
        match self {
            Report::Sentences { count } => {
                writeln!(out, "Total count of sentences in {} is {}", input, count)
            },
            Report::Words { count } => {
                writeln!(out, "Total count of words in {} is {}", input, count)
            },
            Report::Unique { distinct, counts } => {
                write_counts(out, counts)?;
                writeln!(out, "Total count of unique words in {} is {}", input, distinct)
            },
            Report::Top { counts } => {
                writeln!(out, "Top {} words in {}:", counts.len(), input)?;
                write_counts(out, counts)
            },
            Report::Difficult { count } => {
                writeln!(out, "Total count of difficult words in {} is {}", input, count)
            },
            Report::DifficultWords { counts } => {
                writeln!(out, "Difficult words in {}:", input)?;
                write_counts(out, counts)
            },
            Report::Score { score, totals } => {
                writeln!(out, "Dale-Chall score of {} is {:.4} ({} difficult of {} words in {} sentences)",
                         input, score, totals.difficult, totals.words, totals.sentences)
            }
        }
    }

    /// Text form of the report
    pub fn to_text(&self, input: &str) -> String {
        let mut out = String::new();
        // Writing into a String never fails
        let _ = self.write_text(&mut out, input);
        out
    }

    /// Renders the report in the given format
    pub fn render(&self, input: &str, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text(input)),
            OutputFormat::Json => serde_json::to_string_pretty(self).map(|s| s + "\n")
        }
    }
}

#[cfg(test)]
mod report_test {
    use super::*;

    #[test]
    fn test_text() {
        assert_eq!(Report::Sentences { count: 2 }.to_text("in.txt"),
                   "Total count of sentences in in.txt is 2\n");
        let unq = Report::Unique {
            distinct: 2,
            counts: vec![WordCount::new("cat", 1), WordCount::new("the", 2)]
        };
        assert_eq!(unq.to_text("in.txt"),
                   "cat: 1\nthe: 2\nTotal count of unique words in in.txt is 2\n");
    }

    #[test]
    fn test_score_text() {
        let report = Report::Score {
            score: 2.0,
            totals: CorpusTotals { difficult: 1, words: 9, sentences: 2 }
        };
        assert_eq!(report.to_text("a"),
                   "Dale-Chall score of a is 2.0000 (1 difficult of 9 words in 2 sentences)\n");
    }

    #[test]
    fn test_json() {
        let report = Report::Top { counts: vec![WordCount::new("the", 3)] };
        let json: serde_json::Value = serde_json::from_str(
            &report.render("in.txt", OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({
            "mode": "TOP20",
            "counts": [{"word": "the", "count": 3}]
        }));

        let json = serde_json::to_value(&Report::Difficult { count: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "DFF", "count": 4}));
    }
}
