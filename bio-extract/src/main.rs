//! Command-line entry point: extract structured features from a CSV of bios.

use std::path::PathBuf;

use bio_extract::{openai_service, Pipeline};
use bio_extract_core::extraction::config::DEFAULT_MODEL;
use bio_extract_core::extraction::{ExtractionConfig, Extractor};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV file with a header row followed by `id,bio` rows
    #[arg(long, default_value = "bio.csv")]
    input: PathBuf,

    /// Where to write the JSON array of extracted profiles
    #[arg(long, default_value = "extracted_bio_features.json")]
    output: PathBuf,

    /// Model used for extraction
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Total attempts per bio before giving up
    #[arg(long, default_value_t = 5)]
    max_attempts: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let service = openai_service(&cli.model)?;
    let config = ExtractionConfig::default()
        .with_model(cli.model.as_str())
        .with_max_attempts(cli.max_attempts);
    let pipeline = Pipeline::new(Extractor::with_config(service, config));

    tracing::info!("Processing bios...");
    let summary = pipeline.run(&cli.input, &cli.output).await?;

    if summary.failed() > 0 || summary.malformed_rows > 0 {
        tracing::warn!(
            event = "run_incomplete",
            failed = summary.failed(),
            malformed = summary.malformed_rows,
            total = summary.total(),
            "{} of {} rows were not extracted",
            summary.failed() + summary.malformed_rows,
            summary.total()
        );
    }

    Ok(())
}
