//! The capability boundary to an external structured-extraction service.
//!
//! Anything that can take a system prompt, a user prompt and a tool schema and
//! answer with either schema-shaped JSON or prose implements
//! [`StructuredService`]. The retry loop only ever talks to this trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A function/tool declaration the service is asked to fill in.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Tool name presented to the model.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the tool arguments.
    pub parameters: Value,
}

/// One complete request to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Model identifier.
    pub model: String,
    /// Instruction framing the task.
    pub system_prompt: String,
    /// Instruction embedding the raw bio text.
    pub user_prompt: String,
    /// The schema the reply should conform to.
    pub tool: ToolSpec,
}

/// A successful answer from the service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    /// Schema-shaped arguments of a tool call.
    Structured(Value),
    /// The service answered in prose instead of calling the tool.
    Text(String),
}

/// Failure modes reported by the service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service asked us to slow down.
    #[error("Rate limit reached: {0}")]
    RateLimited(String),

    /// A retryable service-side failure (network, 5xx, malformed envelope).
    #[error("Transient service error: {0}")]
    Transient(String),

    /// A failure retrying cannot fix (authentication, invalid request).
    #[error("Fatal service error: {0}")]
    Fatal(String),
}

impl ServiceError {
    /// Whether the retry policy applies to this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transient(_))
    }
}

/// Submit a request, get back structured data, prose, or an error.
#[async_trait]
pub trait StructuredService: Send + Sync {
    /// Sends one request. Called once per attempt.
    async fn submit(&self, request: &ExtractionRequest) -> Result<ServiceReply, ServiceError>;
}

#[async_trait]
impl<T> StructuredService for Arc<T>
where
    T: StructuredService + ?Sized,
{
    async fn submit(&self, request: &ExtractionRequest) -> Result<ServiceReply, ServiceError> {
        (**self).submit(request).await
    }
}
