#![deny(missing_docs)]
//! Batch extraction of structured dating-profile features.
//!
//! Reads `id,bio` rows from a CSV file, sends each bio through the
//! extraction core, and writes every successful profile to a JSON array.

/// Service adapters for concrete LLM providers.
pub mod adapters;
/// Error types for the pipeline.
pub mod errors;
/// Reader → extractor → writer orchestration.
pub mod pipeline;
/// CSV input.
pub mod reader;
/// JSON output.
pub mod writer;

pub use adapters::openai::{openai_service, RigService};
pub use errors::{FormatError, PipelineError};
pub use pipeline::{Pipeline, RecordFailure, RunOutcome, RunSummary};
pub use reader::{BioReader, BioRecord};
pub use writer::{render_profiles, write_profiles};
