mod chain;
mod factory;
mod google;
mod open_ai;

pub use chain::ProviderChain;
pub use factory::ProviderFactory;
pub use google::GoogleProvider;
pub use open_ai::OpenAIProvider;

use crate::error::MealPlanError;
use crate::tier::ModelClass;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

/// A function the model may call instead of answering in free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments
    pub parameters: Value,
}

/// One request to a generative model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub tool: Option<ToolDefinition>,
    pub model_class: ModelClass,
    pub max_output_tokens: u32,
}

/// Structured function-call payload returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    /// Either a JSON object or a string holding JSON, depending on the provider
    pub arguments: Value,
}

/// What came back from the model, before any extraction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_call: Option<ToolCall>,
    /// Name of the model that served the request
    pub model: String,
}

impl ModelResponse {
    pub fn from_text(text: impl Into<String>, model: impl Into<String>) -> Self {
        ModelResponse {
            text: Some(text.into()),
            tool_call: None,
            model: model.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tool_call.is_none() && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google", "openai")
    fn provider_name(&self) -> &str;

    /// Model name this provider uses for a class of request
    fn model_for(&self, class: ModelClass) -> &str;

    /// Send one request and return the raw response
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, MealPlanError>;
}

/// Effective output token limit: the tier's limit, capped by configuration.
pub(crate) fn output_token_limit(configured: Option<u32>, requested: u32) -> u32 {
    configured.map_or(requested, |cap| cap.min(requested))
}

/// Turn a non-2xx response into an error carrying status and body.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, MealPlanError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MealPlanError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: body,
    })
}

/// First non-empty API key among the given environment variables.
pub(crate) fn env_api_key(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}

/// Decode a successful response body. A body that is not JSON reads as
/// `None`, which callers treat as an answer with nothing in it.
pub(crate) async fn read_json_body(
    provider: &str,
    response: reqwest::Response,
) -> Result<Option<Value>, MealPlanError> {
    let body = response.text().await?;
    match serde_json::from_str(&body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            debug!("{} returned a body that is not JSON: {}", provider, e);
            Ok(None)
        }
    }
}
