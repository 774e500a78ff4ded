use crate::config::AiConfig;
use crate::error::MealPlanError;
use crate::providers::{GenerationRequest, LlmProvider, ModelResponse, ProviderFactory};
use crate::tier::ModelClass;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// Tries providers in order, retrying transient failures on each.
pub struct ProviderChain {
    providers: Vec<Box<dyn LlmProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl ProviderChain {
    /// Create a provider chain from configuration
    pub fn new(config: &AiConfig) -> Result<Self, MealPlanError> {
        let retry_attempts = config.chain.retry_attempts.max(1);

        if !config.chain.enabled {
            // If the chain is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(Self::from_providers(
                vec![default_provider],
                retry_attempts,
                config.chain.retry_delay_ms,
            ));
        }

        let timeout = Duration::from_secs(config.timeout);
        let mut providers = Vec::new();
        let mut last_error = None;

        for provider_name in &config.chain.order {
            let Some(provider_config) = config.providers.get(provider_name) else {
                warn!(
                    "Provider '{}' in chain order not found in configuration",
                    provider_name
                );
                continue;
            };

            if !provider_config.enabled {
                continue;
            }

            match ProviderFactory::create(provider_name, provider_config, timeout) {
                Ok(provider) => {
                    info!("Added '{}' to provider chain", provider_name);
                    providers.push(provider);
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_name, e);
                    last_error = Some(e);
                }
            }
        }

        if providers.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                MealPlanError::Builder(
                    "No providers available in chain configuration".to_string(),
                )
            }));
        }

        Ok(Self::from_providers(
            providers,
            retry_attempts,
            config.chain.retry_delay_ms,
        ))
    }

    /// Build a chain from already constructed providers
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Self {
        ProviderChain {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        }
    }

    /// Try a provider, backing off linearly between attempts
    async fn try_provider_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: &GenerationRequest,
    ) -> Result<ModelResponse, MealPlanError> {
        let mut attempt = 1;

        loop {
            debug!(
                "Requesting {} from {} (attempt {}/{})",
                provider.model_for(request.model_class),
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            match provider.generate(request).await {
                Ok(response) => {
                    info!(
                        "Received response from {} ({})",
                        provider.provider_name(),
                        response.model
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );

                    if !e.is_transient() || attempt >= self.retry_attempts {
                        return Err(e);
                    }
                }
            }

            let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
            debug!("Waiting {:?} before retry", delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl LlmProvider for ProviderChain {
    fn provider_name(&self) -> &str {
        "chain"
    }

    fn model_for(&self, class: ModelClass) -> &str {
        self.providers
            .first()
            .map_or("", |provider| provider.model_for(class))
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, MealPlanError> {
        let mut all_errors: Vec<String> = Vec::new();
        let mut last_error = None;

        for provider in &self.providers {
            match self
                .try_provider_with_retry(provider.as_ref(), request)
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                    last_error = Some(e);
                }
            }
        }

        // A lone provider fails with its own error
        match last_error {
            Some(e) if all_errors.len() == 1 => Err(e),
            _ => Err(MealPlanError::Provider(format!(
                "All providers failed: {}",
                all_errors.join("; ")
            ))),
        }
    }
}
