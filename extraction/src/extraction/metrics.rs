//! Per-bio cost accounting: attempts, time spent waiting, and token estimates.

use std::time::Duration;

/// What one call to `Extractor::extract` cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetrics {
    /// Total number of requests sent.
    pub total_attempts: usize,
    /// Wall-clock time elapsed, including backoff sleeps.
    pub wall_time: Duration,
    /// Exponential backoff waits taken between attempts, in order.
    pub backoff_waits: Vec<Duration>,
    /// Estimated input tokens sent across all attempts.
    pub estimated_input_tokens: usize,
    /// Estimated output tokens of the accepted reply.
    pub estimated_output_tokens: usize,
}

/// Rough token count for a prompt or reply: one token per four characters,
/// rounded up.
///
/// ```
/// use bio_extract_core::extraction::estimate_tokens;
///
/// assert_eq!(estimate_tokens("Marathon runner"), 4);
/// assert_eq!(estimate_tokens("山登り"), 1);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
