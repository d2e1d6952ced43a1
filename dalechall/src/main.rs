#[macro_use]
extern crate log;

use std::process;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use dalechall::source::{load_corpus, load_lexicon};
use dalechall::{run_job, Args, JobConfig, OutputFormat};

fn run(config: &JobConfig) -> Result<()> {
    let start = Instant::now();
    let ctx = config.context();
    let input = config.input.display().to_string();

    let corpus = load_corpus(&config.input, config.partitions)?;
    let lexicon = if config.mode.needs_lexicon() {
        Some(Arc::new(load_lexicon(&config.lexicon_path)?))
    } else {
        None
    };

    let report = run_job(&ctx, &corpus, config.mode, config.partitions, lexicon)?;
    let rendered = report.render(&input, config.format)
        .context("rendering the report")?;
    print!("{}", rendered);

    let elapsed = start.elapsed();
    info!("{} finished in {:?}", config.mode, elapsed);
    if config.format == OutputFormat::Text {
        println!("Total execution time: {:.3}sec", elapsed.as_secs_f64());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = JobConfig::from(Args::parse());
    if let Err(e) = run(&config) {
        error!("{} failed: {:?}", config.mode, e);
        eprintln!("{} failed: {:#}", config.mode, e);
        process::exit(1);
    }
}
