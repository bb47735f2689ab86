//! Retry and validation loop for structured profile extraction.
//!
//! - [`Extractor`] - Async request loop with jittered exponential backoff
//! - [`ExtractionError`] - Typed error enum with attempt history
//! - [`ExtractionMetrics`] - Attempt, wait and token metrics
//! - [`ExtractionConfig`] / [`RetryPolicy`] - Prompt, model and retry configuration
//! - [`profile_schema`] / [`validate_payload`] - The extraction schema and its checks

pub mod config;
pub mod error;
pub mod extractor;
pub mod metrics;
pub mod schema;

pub use config::{ExtractionConfig, RetryPolicy};
pub use error::{AttemptRecord, ExtractionError};
pub use extractor::Extractor;
pub use metrics::{estimate_tokens, ExtractionMetrics};
pub use schema::{profile_schema, validate_payload};
