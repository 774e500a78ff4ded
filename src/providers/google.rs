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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_PRO_MODEL: &str = "gemini-2.5-pro";

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    fast_model: String,
    pro_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, MealPlanError> {
        // Try config first, then fall back to environment variables
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| env_api_key(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]))
            .ok_or_else(|| {
                MealPlanError::MissingCredentials(
                    "GEMINI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(GoogleProvider {
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
        GoogleProvider {
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
            "systemInstruction": {
                "parts": [{ "text": request.system }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": output_token_limit(self.max_tokens, request.max_output_tokens)
            }
        });

        if let Some(tool) = &request.tool {
            body["tools"] = json!([{
                "functionDeclarations": [{
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": gemini_schema(&tool.parameters)
                }]
            }]);
        }

        body
    }
}

/// Gemini expects OpenAPI-style upper-case type names (`OBJECT`, `STRING`).
fn gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        // property names must keep their case
                        ("properties", Value::Object(props)) => Value::Object(
                            props
                                .iter()
                                .map(|(name, prop)| (name.clone(), gemini_schema(prop)))
                                .collect(),
                        ),
                        _ => gemini_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(gemini_schema).collect()),
        other => other.clone(),
    }
}

fn parse_response(body: &Value, model: &str) -> ModelResponse {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let text: Vec<&str> = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    let tool_call = parts.iter().find_map(|part| {
        let call = part.get("functionCall")?;
        Some(ToolCall {
            name: call["name"].as_str().unwrap_or_default().to_string(),
            arguments: call.get("args").cloned().unwrap_or(Value::Null),
        })
    });

    ModelResponse {
        text: if text.is_empty() {
            None
        } else {
            Some(text.concat())
        },
        tool_call,
        model: body["modelVersion"].as_str().unwrap_or(model).to_string(),
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_for(&self, class: ModelClass) -> &str {
        match class {
            ModelClass::Fast => &self.fast_model,
            ModelClass::Pro => &self.pro_model,
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, MealPlanError> {
        let model = self.model_for(request.model_class);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(request))
            .send()
            .await?;

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
