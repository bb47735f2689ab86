use async_trait::async_trait;
use bio_extract_core::service::{ExtractionRequest, ServiceError, ServiceReply, StructuredService};
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::{
    message::AssistantContent, CompletionError, CompletionModel, ToolDefinition,
};
use rig::providers::openai;
use serde_json::Value;

use crate::errors::PipelineError;

/// Environment variable holding the OpenAI credential.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// A [`StructuredService`] backed by any Rig `CompletionModel`.
///
/// The system prompt becomes the preamble, the user prompt the message, and
/// the extraction schema a tool definition. The model is fixed when the
/// service is built; `ExtractionRequest::model` is informational here.
#[derive(Clone)]
pub struct RigService<M> {
    model: M,
}

impl<M: CompletionModel> RigService<M> {
    /// Wraps a completion model.
    #[must_use]
    pub const fn new(model: M) -> Self {
        Self { model }
    }
}

/// Builds an OpenAI-backed service for `model` from [`API_KEY_ENV_VAR`].
///
/// # Errors
///
/// Returns `PipelineError::Config` if the API key is not set.
pub fn openai_service(model: &str) -> Result<RigService<impl CompletionModel>, PipelineError> {
    if std::env::var(API_KEY_ENV_VAR).map_or(true, |key| key.trim().is_empty()) {
        return Err(PipelineError::Config(format!(
            "{API_KEY_ENV_VAR} is not set; export it before running"
        )));
    }
    let client: openai::Client = openai::Client::from_env();
    Ok(RigService::new(client.completion_model(model)))
}

#[async_trait]
impl<M> StructuredService for RigService<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn submit(&self, request: &ExtractionRequest) -> Result<ServiceReply, ServiceError> {
        let tool = ToolDefinition {
            name: request.tool.name.clone(),
            description: request.tool.description.clone(),
            parameters: request.tool.parameters.clone(),
        };

        let response = self
            .model
            .completion_request(request.user_prompt.clone())
            .preamble(request.system_prompt.clone())
            .tool(tool)
            .send()
            .await
            .map_err(classify_completion_error)?;

        reply_from_content(response.choice.iter())
    }
}

/// Picks the first tool call out of an assistant turn, falling back to its text.
pub fn reply_from_content<'a, I>(contents: I) -> Result<ServiceReply, ServiceError>
where
    I: IntoIterator<Item = &'a AssistantContent>,
{
    let mut text = String::new();
    for content in contents {
        match content {
            AssistantContent::ToolCall(call) => {
                return tool_arguments(&call.function.arguments).map(ServiceReply::Structured);
            }
            AssistantContent::Text(t) => text.push_str(&t.text),
            _ => {}
        }
    }
    Ok(ServiceReply::Text(text))
}

// Some providers hand back arguments as a JSON-encoded string.
fn tool_arguments(arguments: &Value) -> Result<Value, ServiceError> {
    match arguments {
        Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
            ServiceError::Transient(format!("tool call arguments are not valid JSON: {e}"))
        }),
        other => Ok(other.clone()),
    }
}

/// Maps a Rig completion error onto the retry classes.
#[must_use]
pub fn classify_completion_error(error: CompletionError) -> ServiceError {
    classify_message(error.to_string())
}

/// Classifies a provider error message.
///
/// The `type` and `code` of an OpenAI error body are trusted first. Status
/// codes only count as whole tokens, so digits inside request ids, org ids or
/// token counts never change the class. Quota exhaustion arrives with status
/// 429 but never clears on retry, so it is checked before the rate-limit rules.
#[must_use]
pub fn classify_message(message: String) -> ServiceError {
    let lower = message.to_lowercase();
    let markers = api_error_markers(&lower);
    let marked = |names: &[&str]| markers.iter().any(|m| names.contains(&m.as_str()));
    let status = |codes: &[&str]| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| codes.contains(&token))
    };
    let says = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

    if marked(&["insufficient_quota"]) || says(&["insufficient_quota"]) {
        ServiceError::Fatal(message)
    } else if marked(&["server_error"]) {
        ServiceError::Transient(message)
    } else if marked(&["rate_limit_exceeded", "rate_limit_error"])
        || status(&["429"])
        || says(&["rate limit", "rate_limit_exceeded", "too many requests"])
    {
        ServiceError::RateLimited(message)
    } else if marked(&[
        "invalid_api_key",
        "invalid_request_error",
        "authentication_error",
        "permission_error",
        "model_not_found",
    ]) || status(&["400", "401", "403"])
        || says(&["invalid_api_key", "incorrect api key", "unauthorized"])
    {
        ServiceError::Fatal(message)
    } else {
        ServiceError::Transient(message)
    }
}

/// Collects `error.type` and `error.code` from the first JSON object embedded
/// in a provider message, if any.
fn api_error_markers(message: &str) -> Vec<String> {
    let Some(body) = message.find('{').map(|at| &message[at..]) else {
        return Vec::new();
    };
    let Some(Ok(value)) = serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next()
    else {
        return Vec::new();
    };
    let error = value.get("error").unwrap_or(&value);
    ["type", "code"]
        .iter()
        .filter_map(|key| error.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
