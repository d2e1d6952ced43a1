use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lexflow::ExecutionContext;

use crate::job::Mode;
use crate::report::OutputFormat;

/// Which scheduler runs the job's task graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulerKind {
    /// Dispatches each task as soon as its inputs are ready
    Greedy,
    /// Runs the graph level by level on the rayon pool
    Leveled
}

/// Text analysis via the Dale-Chall formula
#[derive(Parser, Debug)]
#[command(name = "dalechall", version, about)]
pub struct Args {
    /// Mode of operation
    #[arg(value_enum)]
    pub mode: Mode,

    /// Text file to be processed, one sentence per line
    pub input: PathBuf,

    /// Number of partitions used for the corpus and for word counts
    #[arg(long = "N", visible_alias = "partitions", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub partitions: u64,

    /// File containing the Dale-Chall easy word list, one word per line
    #[arg(long = "simple-words", visible_alias = "simple_words",
          default_value = "DaleChallEasyWordList.txt")]
    pub simple_words: PathBuf,

    /// Worker threads used by the greedy scheduler
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: u64,

    /// Scheduler used to run the job
    #[arg(long, value_enum, default_value_t = SchedulerKind::Greedy)]
    pub scheduler: SchedulerKind,

    /// Attempts per task before the job fails
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_attempts: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat
}

/// Everything needed to run one job
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub mode: Mode,
    pub input: PathBuf,
    pub partitions: usize,
    pub lexicon_path: PathBuf,
    pub workers: usize,
    pub scheduler: SchedulerKind,
    pub max_attempts: usize,
    pub format: OutputFormat
}

impl From<Args> for JobConfig {
    fn from(args: Args) -> Self {
        JobConfig {
            mode: args.mode,
            input: args.input,
            partitions: args.partitions as usize,
            lexicon_path: args.simple_words,
            workers: args.workers as usize,
            scheduler: args.scheduler,
            max_attempts: args.max_attempts as usize,
            format: args.format
        }
    }
}

impl JobConfig {

    /// A fresh execution context for this job
    pub fn context(&self) -> ExecutionContext {
        let ctx = match self.scheduler {
            SchedulerKind::Greedy => ExecutionContext::greedy(self.workers),
            SchedulerKind::Leveled => ExecutionContext::leveled()
        };
        ctx.with_max_attempts(self.max_attempts)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    fn parse(args: &[&str]) -> Result<JobConfig, clap::Error> {
        Args::try_parse_from(args).map(JobConfig::from)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["dalechall", "SEN", "corpus.txt"]).unwrap();
        assert_eq!(config, JobConfig {
            mode: Mode::Sen,
            input: "corpus.txt".into(),
            partitions: 20,
            lexicon_path: "DaleChallEasyWordList.txt".into(),
            workers: 20,
            scheduler: SchedulerKind::Greedy,
            max_attempts: 2,
            format: OutputFormat::Text
        });
        assert_eq!(config.context().max_attempts(), 2);
    }

    #[test]
    fn test_options() {
        let config = parse(&["dalechall", "DCF", "in.txt", "--N", "7", "--simple_words", "easy.txt",
                             "--scheduler", "leveled", "--max-attempts", "3", "--format", "json"]).unwrap();
        assert_eq!(config.mode, Mode::Dcf);
        assert_eq!(config.partitions, 7);
        assert_eq!(config.lexicon_path, PathBuf::from("easy.txt"));
        assert_eq!(config.scheduler, SchedulerKind::Leveled);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.context().max_attempts(), 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["dalechall", "XYZ", "in.txt"]).is_err());
        assert!(parse(&["dalechall", "TOP20", "in.txt", "--N", "0"]).is_err());
        assert!(parse(&["dalechall", "DFFP", "in.txt", "--workers", "0"]).is_err());
        assert!(parse(&["dalechall", "WRD"]).is_err());
    }
}
