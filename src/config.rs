use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Main AI configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Provider used when no chain order is configured
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider chain and retry behaviour
    #[serde(default)]
    pub chain: ChainConfig,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            chain: ChainConfig::default(),
            timeout: default_timeout(),
        }
    }
}

/// Configuration for a specific AI provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model used for free and basic tiers (e.g. "gemini-2.5-flash")
    pub fast_model: Option<String>,
    /// Model used for premium tiers (e.g. "gemini-2.5-pro")
    pub pro_model: Option<String>,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Cap on generated tokens; the tier's own limit applies when unset
    pub max_tokens: Option<u32>,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fast_model: None,
            pro_model: None,
            temperature: default_temperature(),
            max_tokens: None,
            api_key: None,
            base_url: None,
        }
    }
}

/// Configuration for trying several providers and retrying transient failures
#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    /// Whether to walk `order` instead of using only the default provider
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Attempts per provider, first call included
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay before the first retry in milliseconds, grows linearly per attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "google".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

// One call plus a single retry
fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    60
}

impl AiConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MEALPLAN__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: MEALPLAN__PROVIDERS__GOOGLE__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Configuration with a single enabled provider and nothing else set.
    pub fn single(provider_name: &str, provider: ProviderConfig) -> Self {
        let mut providers = HashMap::new();
        providers.insert(provider_name.to_string(), provider);
        Self {
            default_provider: provider_name.to_string(),
            providers,
            ..Self::default()
        }
    }
}

/// Load configuration from file and environment variables
///
/// See [`AiConfig::load`] for the precedence rules.
pub fn load_config() -> Result<AiConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: MEALPLAN__PROVIDERS__GOOGLE__API_KEY
        .add_source(
            Environment::with_prefix("MEALPLAN")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_provider(), "google");
        assert_eq!(default_temperature(), 0.7);
        assert_eq!(default_retry_attempts(), 2);
        assert_eq!(default_retry_delay_ms(), 1000);
        assert_eq!(default_timeout(), 60);
    }

    #[test]
    fn test_chain_config_default() {
        let chain = ChainConfig::default();
        assert!(!chain.enabled);
        assert!(chain.order.is_empty());
        assert_eq!(chain.retry_attempts, 2);
    }

    #[test]
    fn test_provider_config_defaults_from_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                r#"
                default_provider = "openai"

                [providers.openai]
                api_key = "test-key"
                pro_model = "gpt-4o"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: AiConfig = settings.try_deserialize().unwrap();
        let openai = &config.providers["openai"];
        assert!(openai.enabled);
        assert_eq!(openai.temperature, 0.7);
        assert_eq!(openai.pro_model.as_deref(), Some("gpt-4o"));
        assert!(openai.fast_model.is_none());
        assert_eq!(config.timeout, 60);
        assert!(!config.chain.enabled);
    }

    #[test]
    fn test_chain_from_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [providers.google]
                api_key = "g"

                [providers.openai]
                api_key = "o"

                [chain]
                enabled = true
                order = ["google", "openai"]
                retry_attempts = 3
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: AiConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.chain.order, vec!["google", "openai"]);
        assert_eq!(config.chain.retry_attempts, 3);
        assert_eq!(config.chain.retry_delay_ms, 1000);
    }

    #[test]
    fn test_single_provider_config() {
        let config = AiConfig::single("google", ProviderConfig::default());
        assert_eq!(config.default_provider, "google");
        assert_eq!(config.providers.len(), 1);
    }

    #[test]
    fn test_empty_config_deserializes() {
        let settings = Config::builder().build().unwrap();
        let config: AiConfig = settings.try_deserialize().unwrap();
        assert!(config.providers.is_empty());
        assert_eq!(config.default_provider, "google");
    }
}
