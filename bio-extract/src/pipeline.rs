//! Batch orchestration: reader → extractor → writer.

use std::collections::HashSet;
use std::path::Path;

use bio_extract_core::extraction::{ExtractionError, Extractor};
use bio_extract_core::profile::ProfileRecord;
use bio_extract_core::service::StructuredService;

use crate::errors::{FormatError, PipelineError};
use crate::reader::{BioReader, BioRecord};
use crate::writer::write_profiles;

/// A bio that produced no profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Identifier of the row.
    pub id: String,
    /// 1-based input line.
    pub line: u64,
    /// Human-readable cause.
    pub reason: String,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Bios turned into profiles.
    pub succeeded: usize,
    /// Bios that were read but not extracted.
    pub failures: Vec<RecordFailure>,
    /// Rows that could not be read at all.
    pub malformed_rows: usize,
    /// Estimated prompt tokens sent for successful and exhausted bios.
    pub estimated_input_tokens: usize,
    /// Estimated tokens in the accepted replies.
    pub estimated_output_tokens: usize,
}

impl RunSummary {
    /// Number of bios that were read but not extracted.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of data rows seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len() + self.malformed_rows
    }
}

/// Profiles collected by [`Pipeline::process`] with the matching summary.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Successful extractions, in input order.
    pub profiles: Vec<ProfileRecord>,
    /// What happened to every row.
    pub summary: RunSummary,
}

/// Runs one extractor over a whole input file, one bio at a time.
pub struct Pipeline<S> {
    extractor: Extractor<S>,
}

impl<S: StructuredService> Pipeline<S> {
    /// Creates a pipeline around an extractor.
    #[must_use]
    pub const fn new(extractor: Extractor<S>) -> Self {
        Self { extractor }
    }

    /// The extractor used for every bio.
    #[must_use]
    pub const fn extractor(&self) -> &Extractor<S> {
        &self.extractor
    }

    /// Reads `input`, extracts every bio, then writes all profiles to `output` once.
    ///
    /// # Errors
    ///
    /// Only environment failures escape: the input cannot be opened or the
    /// output cannot be written. Per-record failures are logged and counted.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunSummary, PipelineError> {
        let reader = BioReader::open(input)?;
        let outcome = self.process(reader.records()).await;

        tracing::info!(
            event = "saving_results",
            path = %output.display(),
            "Saving results to {}...",
            output.display()
        );
        write_profiles(output, &outcome.profiles)?;

        let summary = outcome.summary;
        tracing::info!(
            event = "run_complete",
            succeeded = summary.succeeded,
            failed = summary.failed(),
            malformed = summary.malformed_rows,
            input_tokens = summary.estimated_input_tokens,
            output_tokens = summary.estimated_output_tokens,
            "Processed {} bios. Results saved to {}",
            summary.succeeded,
            output.display()
        );
        Ok(summary)
    }

    /// Extracts every record, never stopping on a per-record failure.
    pub async fn process<I>(&self, records: I) -> RunOutcome
    where
        I: IntoIterator<Item = Result<BioRecord, FormatError>>,
    {
        let mut outcome = RunOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for row in records {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(event = "row_skipped", error = %e, "Skipping malformed row: {e}");
                    outcome.summary.malformed_rows += 1;
                    continue;
                }
            };

            if seen.contains(&record.id) {
                tracing::warn!(
                    event = "duplicate_id",
                    id = %record.id,
                    line = record.line,
                    "Skipping duplicate ID: {}",
                    record.id
                );
                outcome.summary.failures.push(RecordFailure {
                    reason: format!("duplicate id (already extracted), line {}", record.line),
                    id: record.id,
                    line: record.line,
                });
                continue;
            }

            match self.extractor.extract(&record.text).await {
                Ok((profile, metrics)) => {
                    tracing::info!(
                        event = "record_processed",
                        id = %record.id,
                        attempts = metrics.total_attempts,
                        wall_time = ?metrics.wall_time,
                        input_tokens = metrics.estimated_input_tokens,
                        output_tokens = metrics.estimated_output_tokens,
                        "Successfully processed ID: {}",
                        record.id
                    );
                    seen.insert(record.id.clone());
                    outcome.profiles.push(ProfileRecord::new(record.id, profile));
                    outcome.summary.succeeded += 1;
                    outcome.summary.estimated_input_tokens += metrics.estimated_input_tokens;
                    outcome.summary.estimated_output_tokens += metrics.estimated_output_tokens;
                }
                Err(e) => {
                    if let ExtractionError::ExhaustedRetries { metrics, .. } = &e {
                        outcome.summary.estimated_input_tokens += metrics.estimated_input_tokens;
                    }
                    tracing::warn!(
                        event = "record_failed",
                        id = %record.id,
                        line = record.line,
                        error = %e,
                        "Failed to extract information for ID: {}",
                        record.id
                    );
                    outcome.summary.failures.push(RecordFailure {
                        id: record.id,
                        line: record.line,
                        reason: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}
