use crate::config::ProviderConfig;
use crate::error::MealPlanError;
use crate::providers::{
    check_status, env_api_key, output_token_limit, read_json_body, GenerationRequest, LlmProvider,
    ModelResponse, ToolCall,
};
use crate::tier::ModelClass;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PRO_MODEL: &str = "gpt-4o";

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    fast_model: String,
    pro_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, MealPlanError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| env_api_key(&["OPENAI_API_KEY"]))
            .ok_or_else(|| {
                MealPlanError::MissingCredentials(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(OpenAIProvider {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fast_model: config
                .fast_model
                .clone()
                .unwrap_or_else(|| DEFAULT_FAST_MODEL.to_string()),
            pro_model: config
                .pro_model
                .clone()
                .unwrap_or_else(|| DEFAULT_PRO_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.model_for(request.model_class),
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.prompt}
            ],
            "temperature": self.temperature,
            "max_tokens": output_token_limit(self.max_tokens, request.max_output_tokens)
        });

        if let Some(tool) = &request.tool {
            body["tools"] = json!([{
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters
                }
            }]);
            body["tool_choice"] = json!({
                "type": "function",
                "function": { "name": tool.name }
            });
        }

        body
    }
}

fn parse_response(body: &Value, model: &str) -> ModelResponse {
    let message = &body["choices"][0]["message"];

    // arguments arrive as a JSON-encoded string
    let tool_call = message["tool_calls"][0]["function"]
        .as_object()
        .map(|function| ToolCall {
            name: function
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            arguments: function.get("arguments").cloned().unwrap_or(Value::Null),
        });

    ModelResponse {
        text: message["content"].as_str().map(str::to_string),
        tool_call,
        model: body["model"].as_str().unwrap_or(model).to_string(),
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_for(&self, class: ModelClass) -> &str {
        match class {
            ModelClass::Fast => &self.fast_model,
            ModelClass::Pro => &self.pro_model,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, MealPlanError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(request))
            .send()
            .await?;

        let model = self.model_for(request.model_class);
        let response = check_status(self.provider_name(), response).await?;
        let Some(response_body) = read_json_body(self.provider_name(), response).await? else {
            return Ok(ModelResponse {
                model: model.to_string(),
                ..ModelResponse::default()
            });
        };
        debug!("{:?}", response_body);

        Ok(parse_response(&response_body, model))
    }
}
