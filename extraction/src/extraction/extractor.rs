//! Request loop with jittered exponential backoff for structured extraction.

use serde_json::Value;
use tokio::time::{sleep, Instant};

use super::config::ExtractionConfig;
use super::error::{AttemptRecord, ExtractionError};
use super::metrics::{estimate_tokens, ExtractionMetrics};
use super::schema::{drop_null_fields, validate_payload};
use crate::profile::ExtractedProfile;
use crate::service::{ExtractionRequest, ServiceError, ServiceReply, StructuredService, ToolSpec};

/// Turns bio text into an [`ExtractedProfile`] through a [`StructuredService`].
///
/// Rate limits and transient failures are retried under the configured
/// [`RetryPolicy`](super::RetryPolicy); prose replies, fatal errors and
/// payloads that fail the schema end the extraction immediately.
pub struct Extractor<S> {
    service: S,
    config: ExtractionConfig,
}

impl<S: StructuredService> Extractor<S> {
    /// Creates an extractor with the default configuration.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self {
            service,
            config: ExtractionConfig::default(),
        }
    }

    /// Creates an extractor with the given configuration.
    #[must_use]
    pub const fn with_config(service: S, config: ExtractionConfig) -> Self {
        Self { service, config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// The underlying service.
    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Builds the request sent for `bio_text` on every attempt.
    #[must_use]
    pub fn build_request(&self, bio_text: &str) -> ExtractionRequest {
        ExtractionRequest {
            model: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone(),
            user_prompt: format!("{}{bio_text}", self.config.user_prompt_prefix),
            tool: ToolSpec {
                name: self.config.tool_name.clone(),
                description: self.config.tool_description.clone(),
                parameters: self.config.schema.clone(),
            },
        }
    }

    /// Runs the extraction for one bio.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::NonStructuredResponse` if the service answers in prose.
    /// - `ExtractionError::ExhaustedRetries` once `max_attempts` retryable failures occurred.
    /// - `ExtractionError::Service` on a non-retryable service error.
    /// - `ExtractionError::InvalidPayload` / `Deserialize` if the payload does not fit.
    pub async fn extract(
        &self,
        bio_text: &str,
    ) -> Result<(ExtractedProfile, ExtractionMetrics), ExtractionError> {
        let start = Instant::now();
        let request = self.build_request(bio_text);
        let request_tokens =
            estimate_tokens(&request.system_prompt) + estimate_tokens(&request.user_prompt);
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);

        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut backoff_waits = Vec::new();

        for attempt in 1..=max_attempts {
            let error = match self.service.submit(&request).await {
                Ok(ServiceReply::Structured(payload)) => {
                    let estimated_output_tokens = estimate_tokens(&payload.to_string());
                    let profile = self.parse_payload(payload)?;
                    let metrics = ExtractionMetrics {
                        total_attempts: attempt,
                        wall_time: start.elapsed(),
                        backoff_waits,
                        estimated_input_tokens: request_tokens * attempt,
                        estimated_output_tokens,
                    };
                    return Ok((profile, metrics));
                }
                Ok(ServiceReply::Text(text)) => {
                    tracing::warn!(
                        event = "non_structured_response",
                        attempt,
                        "Function call not triggered. The response might be a message instead of structured data."
                    );
                    return Err(ExtractionError::NonStructuredResponse { text, attempt });
                }
                Err(error) if !error.is_retryable() => {
                    tracing::warn!(
                        event = "service_error_fatal",
                        attempt,
                        error = %error,
                        "Service rejected the request, not retrying: {error}"
                    );
                    return Err(ExtractionError::Service(error));
                }
                Err(error) => error,
            };

            let is_last = attempt == max_attempts;
            let jitter = match &error {
                ServiceError::RateLimited(_) if !is_last => Some(retry.jitter()),
                _ => None,
            };
            let backoff = (!is_last).then(|| retry.backoff_for(attempt));

            tracing::warn!(
                event = "attempt_failed",
                attempt,
                max_attempts,
                error = %error,
                jitter = ?jitter,
                backoff = ?backoff,
                "Attempt {attempt}/{max_attempts} failed: {error}"
            );

            history.push(AttemptRecord {
                attempt_number: attempt,
                error,
                jitter,
                backoff,
                elapsed: start.elapsed(),
            });

            if let Some(wait) = jitter {
                sleep(wait).await;
            }
            if let Some(wait) = backoff {
                sleep(wait).await;
                backoff_waits.push(wait);
            }
        }

        let last_error = history
            .last()
            .map(|record| record.error.to_string())
            .unwrap_or_default();
        let metrics = ExtractionMetrics {
            total_attempts: max_attempts,
            wall_time: start.elapsed(),
            backoff_waits,
            estimated_input_tokens: request_tokens * max_attempts,
            estimated_output_tokens: 0,
        };

        tracing::warn!(
            event = "retries_exhausted",
            attempts = max_attempts,
            last_error = %last_error,
            "Giving up after {max_attempts} attempts"
        );

        Err(ExtractionError::ExhaustedRetries {
            attempts: max_attempts,
            last_error,
            history,
            metrics,
        })
    }

    fn parse_payload(&self, payload: Value) -> Result<ExtractedProfile, ExtractionError> {
        let payload = drop_null_fields(payload);

        let errors = validate_payload(&self.config.schema, &payload);
        if !errors.is_empty() {
            return Err(ExtractionError::InvalidPayload { errors, payload });
        }

        serde_json::from_value(payload.clone()).map_err(|e| ExtractionError::Deserialize {
            message: e.to_string(),
            payload,
        })
    }
}
