//! Error types for extraction with attempt history tracking.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::metrics::ExtractionMetrics;
use crate::service::ServiceError;

/// Record of a single failed, retryable attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// The attempt number (1-indexed).
    pub attempt_number: usize,
    /// What the service reported.
    pub error: ServiceError,
    /// Rate-limit jitter slept before the backoff, if any.
    pub jitter: Option<Duration>,
    /// Backoff slept before the next attempt; `None` after the last attempt.
    pub backoff: Option<Duration>,
    /// Elapsed time when the attempt failed.
    pub elapsed: Duration,
}

/// Errors that end extraction of one bio.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The service answered with prose instead of calling the extraction tool.
    #[error("Function call not triggered at attempt {attempt}: the service answered with a message instead of structured data")]
    NonStructuredResponse {
        /// The prose the service returned.
        text: String,
        /// Attempt number that produced it.
        attempt: usize,
    },

    /// The retry budget was consumed.
    #[error("Extraction failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        /// Number of attempts made.
        attempts: usize,
        /// Display form of the final service error.
        last_error: String,
        /// Every failed attempt with its waits.
        history: Vec<AttemptRecord>,
        /// Metrics tracked across all attempts.
        metrics: ExtractionMetrics,
    },

    /// The structured payload did not satisfy the schema.
    #[error("Structured payload failed validation: {}", errors.join("; "))]
    InvalidPayload {
        /// Validation error messages with instance paths.
        errors: Vec<String>,
        /// The offending payload.
        payload: Value,
    },

    /// The payload passed validation but did not fit the profile type.
    #[error("Payload deserialization failed: {message}")]
    Deserialize {
        /// Deserializer message.
        message: String,
        /// The offending payload.
        payload: Value,
    },

    /// The service reported a failure retrying cannot fix.
    #[error(transparent)]
    Service(ServiceError),
}

impl ExtractionError {
    /// Number of requests that were sent before giving up, when known.
    #[must_use]
    pub const fn attempts(&self) -> Option<usize> {
        match self {
            Self::NonStructuredResponse { attempt, .. } => Some(*attempt),
            Self::ExhaustedRetries { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
