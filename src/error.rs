use thiserror::Error;

/// Errors that can occur while talking to a model provider or setting one up
#[derive(Error, Debug)]
pub enum MealPlanError {
    /// Transport-level failure talking to the provider
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("{provider} API returned {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Provider answered, but not with something we can use
    #[error("Provider error: {0}")]
    Provider(String),

    /// No API key in config or environment
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Provider is present in configuration but switched off
    #[error("Provider '{0}' is not enabled in configuration")]
    ProviderDisabled(String),

    /// Provider name the factory does not know about
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Subscription tier string that is not one of the known tiers
    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl MealPlanError {
    /// Whether the error comes from missing or unusable configuration rather
    /// than from the upstream call itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MealPlanError::MissingCredentials(_)
                | MealPlanError::ProviderDisabled(_)
                | MealPlanError::UnknownProvider(_)
                | MealPlanError::ConfigError(_)
                | MealPlanError::Builder(_)
        )
    }

    /// Whether repeating the same request might succeed: network failures,
    /// rate limiting and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            MealPlanError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MealPlanError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
