use crate::config::{AiConfig, ProviderConfig};
use crate::error::MealPlanError;
use crate::providers::{GoogleProvider, LlmProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, MealPlanError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(MealPlanError::ProviderDisabled(provider_name.to_string()));
        }

        match provider_name {
            "google" | "gemini" => Ok(Box::new(GoogleProvider::new(config, timeout)?)),
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            _ => Err(MealPlanError::UnknownProvider(format!(
                "{} (available: {})",
                provider_name,
                Self::available_providers().join(", ")
            ))),
        }
    }

    /// Get the default provider from configuration
    ///
    /// A default provider with no configuration section is created from
    /// defaults, so an API key in the environment is enough to run.
    pub fn get_default_provider(config: &AiConfig) -> Result<Box<dyn LlmProvider>, MealPlanError> {
        let provider_name = &config.default_provider;
        let fallback_config = ProviderConfig::default();
        let provider_config = config
            .providers
            .get(provider_name)
            .unwrap_or(&fallback_config);

        Self::create(
            provider_name,
            provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["google", "openai"]
    }
}
