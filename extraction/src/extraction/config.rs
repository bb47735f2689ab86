//! Configuration for extraction prompts, model selection and retry behavior.

use std::time::Duration;

use rand::Rng;
use serde_json::Value;

use super::schema::profile_schema;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default system instruction framing the task.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI assistant that extracts structured information from dating profile bios.";

/// Default user instruction; the bio text is appended after it.
pub const DEFAULT_USER_PROMPT_PREFIX: &str =
    "Extract key information from this bio according to the provided schema: ";

/// Name of the extraction tool presented to the model.
pub const DEFAULT_TOOL_NAME: &str = "extract_bio_info";

/// Description of the extraction tool.
pub const DEFAULT_TOOL_DESCRIPTION: &str =
    "Extracts structured information from a dating profile bio";

/// Retry policy: jittered wait on rate limits, then exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (default: 5).
    pub max_attempts: usize,
    /// Backoff after the first failed attempt (default: 1s).
    pub initial_backoff: Duration,
    /// Backoff ceiling (default: 60s).
    pub max_backoff: Duration,
    /// Uniform range of the extra wait taken on a rate limit (default: 1s..=5s).
    pub rate_limit_jitter: (Duration, Duration),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            rate_limit_jitter: (Duration::from_secs(1), Duration::from_secs(5)),
        }
    }
}

impl RetryPolicy {
    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the initial and ceiling backoff.
    #[must_use]
    pub const fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the rate-limit jitter range.
    #[must_use]
    pub const fn with_rate_limit_jitter(mut self, low: Duration, high: Duration) -> Self {
        self.rate_limit_jitter = (low, high);
        self
    }

    /// Backoff to wait after the `failed_attempt`-th attempt (1-indexed).
    ///
    /// Doubles from `initial_backoff` and is clamped to `max_backoff`, never
    /// going below `initial_backoff`.
    ///
    /// ```
    /// use bio_extract_core::extraction::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
    /// assert_eq!(policy.backoff_for(4), Duration::from_secs(8));
    /// assert_eq!(policy.backoff_for(10), Duration::from_secs(60));
    /// ```
    #[must_use]
    pub fn backoff_for(&self, failed_attempt: usize) -> Duration {
        let exponent = u32::try_from(failed_attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let factor = 2_u32.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |wait| wait.min(self.max_backoff))
            .max(self.initial_backoff)
    }

    /// Samples the extra wait taken before retrying a rate-limited request.
    #[must_use]
    pub fn jitter(&self) -> Duration {
        let (low, high) = self.rate_limit_jitter;
        if high <= low {
            return low;
        }
        let secs = rand::rng().random_range(low.as_secs_f64()..=high.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Everything the extractor needs besides the service itself.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Model identifier forwarded to the service (default: `gpt-4o`).
    pub model: String,
    /// System instruction.
    pub system_prompt: String,
    /// User instruction prefix; the bio is appended verbatim.
    pub user_prompt_prefix: String,
    /// Tool name presented to the model.
    pub tool_name: String,
    /// Tool description presented to the model.
    pub tool_description: String,
    /// Schema of the tool arguments, also used to validate replies.
    pub schema: Value,
    /// Retry behavior.
    pub retry: RetryPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt_prefix: DEFAULT_USER_PROMPT_PREFIX.to_string(),
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            tool_description: DEFAULT_TOOL_DESCRIPTION.to_string(),
            schema: profile_schema(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractionConfig {
    /// Set the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max: usize) -> Self {
        self.retry.max_attempts = max;
        self
    }

    /// Replace the extraction schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}
