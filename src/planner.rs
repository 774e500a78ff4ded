use std::time::Duration;

use log::{debug, error, info};
use serde_json::Value;

use crate::config::{AiConfig, ProviderConfig};
use crate::error::MealPlanError;
use crate::extractors::ExtractionChain;
use crate::fallback::FALLBACK_MODEL;
use crate::model::{
    GenerationResult, Meal, MealPlanDocument, NutritionInsights, NutritionInsightsResult,
    ShoppingList, ShoppingListResult, SwapResult,
};
use crate::preferences::Preferences;
use crate::prompt::{
    build_meal_plan_prompt, build_nutrition_insights_prompt, build_shopping_list_prompt,
    build_swap_prompt, ASSISTANT_SYSTEM_PROMPT,
};
use crate::providers::{
    GenerationRequest, LlmProvider, ProviderChain, ProviderFactory, ToolDefinition,
};
use crate::schema::{TOOL_DESCRIPTION, TOOL_NAME};
use crate::tier::{ModelClass, Tier};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

// Follow-up requests are small; the free tier budget is plenty.
const FOLLOW_UP_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Generates meal plans, meal swaps, shopping lists and nutrition insights
/// through one provider.
///
/// Construct it once and share it; every call is independent.
pub struct MealPlanner {
    provider: Box<dyn LlmProvider>,
    extraction: ExtractionChain,
}

impl MealPlanner {
    /// Planner around an already constructed provider
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        MealPlanner {
            provider,
            extraction: ExtractionChain::default(),
        }
    }

    /// Planner using the provider chain described by `config`
    ///
    /// # Errors
    /// Returns a configuration error when no provider can be constructed,
    /// e.g. because no API key is available.
    pub fn from_config(config: &AiConfig) -> Result<Self, MealPlanError> {
        Ok(Self::new(Box::new(ProviderChain::new(config)?)))
    }

    /// Creates a new builder for a single-provider planner
    ///
    /// # Example
    /// ```
    /// use meal_planner::MealPlanner;
    ///
    /// let planner = MealPlanner::builder()
    ///     .provider("openai")
    ///     .api_key("sk-test")
    ///     .build();
    /// assert!(planner.is_ok());
    /// ```
    pub fn builder() -> MealPlannerBuilder {
        MealPlannerBuilder::default()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Model a tier's meal plan request is routed to
    pub fn model_for(&self, tier: Tier) -> &str {
        self.provider.model_for(tier.model_class())
    }

    /// Generate a meal plan from raw preferences.
    ///
    /// Never fails: an upstream error becomes an unsuccessful result, and a
    /// response without a usable plan is replaced by the tier's fallback
    /// document with `model` set to `"fallback"`.
    ///
    /// # Example
    /// ```no_run
    /// # use meal_planner::{MealPlanner, Tier};
    /// # use serde_json::json;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let planner = MealPlanner::builder().api_key("your-api-key").build()?;
    /// let result = planner
    ///     .generate(&json!({ "dietaryRestrictions": ["vegetarian"] }), Tier::Basic)
    ///     .await;
    /// assert!(result.success);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate(&self, preferences: &Value, tier: Tier) -> GenerationResult {
        let profile = tier.profile();
        let preferences = Preferences::normalize(preferences, tier);
        let prompt = build_meal_plan_prompt(&preferences, tier);

        let request = GenerationRequest {
            system: prompt.system,
            prompt: prompt.user,
            tool: Some(ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: TOOL_DESCRIPTION.to_string(),
                parameters: prompt.schema,
            }),
            model_class: profile.model_class,
            max_output_tokens: profile.max_output_tokens,
        };

        info!(
            "Generating {} meal plan with {}",
            tier,
            self.provider.model_for(profile.model_class)
        );

        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Meal plan generation failed: {}", e);
                return GenerationResult::failure(format!("Failed to generate meal plan: {}", e));
            }
        };

        let extraction = self.extraction.extract_meal_plan(&response, tier);
        let model = match extraction.strategy {
            Some(strategy) => {
                debug!(
                    "Meal plan read with {} from {}: {} meals over {} days",
                    strategy,
                    response.model,
                    extraction.document.meal_count(),
                    extraction.document.days.len()
                );
                response.model
            }
            None => FALLBACK_MODEL.to_string(),
        };

        GenerationResult::success(extraction.document, model)
    }

    /// Suggest a replacement for one meal of a plan.
    ///
    /// Swapping needs the basic tier or higher and always uses the fast model.
    pub async fn swap_meal(&self, current: &Meal, preferences: &Value, tier: Tier) -> SwapResult {
        if tier < Tier::Basic {
            return SwapResult::failure("Meal swapping requires Basic tier or higher");
        }

        let preferences = Preferences::normalize(preferences, tier);
        let request = GenerationRequest {
            system: ASSISTANT_SYSTEM_PROMPT.to_string(),
            prompt: build_swap_prompt(current, &preferences),
            tool: None,
            model_class: ModelClass::Fast,
            max_output_tokens: FOLLOW_UP_MAX_OUTPUT_TOKENS,
        };

        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Meal swap failed: {}", e);
                return SwapResult::failure(format!("Failed to swap meal: {}", e));
            }
        };

        if response.is_empty() {
            return SwapResult::failure("No valid meal generated");
        }

        match self.extraction.extract::<Meal>(&response) {
            Some((mut meal, _)) => {
                if meal.meal_type != current.meal_type {
                    debug!(
                        "Swap returned a {} for a {}, keeping the original type",
                        meal.meal_type, current.meal_type
                    );
                    meal.meal_type = current.meal_type;
                }
                SwapResult::success(meal)
            }
            None => SwapResult::failure("Failed to parse meal swap"),
        }
    }

    /// Consolidated shopping list for a plan, leaving out pantry items.
    ///
    /// Premium tiers also get per-item cost estimates and savings tips.
    pub async fn shopping_list(
        &self,
        plan: &MealPlanDocument,
        pantry_items: &[String],
        tier: Tier,
    ) -> ShoppingListResult {
        let request = GenerationRequest {
            system: ASSISTANT_SYSTEM_PROMPT.to_string(),
            prompt: build_shopping_list_prompt(plan, pantry_items, tier),
            tool: None,
            model_class: if tier == Tier::Free {
                ModelClass::Fast
            } else {
                ModelClass::Pro
            },
            max_output_tokens: tier.profile().max_output_tokens,
        };

        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Shopping list generation failed: {}", e);
                return ShoppingListResult::failure(format!(
                    "Failed to generate shopping list: {}",
                    e
                ));
            }
        };

        if response.is_empty() {
            return ShoppingListResult::failure("No valid shopping list generated");
        }

        match self.extraction.extract::<ShoppingList>(&response) {
            Some((list, _)) => ShoppingListResult::success(list),
            None => ShoppingListResult::failure("Failed to parse shopping list"),
        }
    }

    /// Nutritionist review of a plan: overall score, macro split,
    /// micronutrient highlights, recommendations and per-member notes.
    /// Premium tiers only; always answered by the pro model.
    pub async fn nutrition_insights(
        &self,
        plan: &MealPlanDocument,
        family_profiles: &[Value],
        tier: Tier,
    ) -> NutritionInsightsResult {
        if !tier.is_premium() {
            return NutritionInsightsResult::failure(
                "Nutrition insights require Premium tier or higher",
            );
        }

        let request = GenerationRequest {
            system: ASSISTANT_SYSTEM_PROMPT.to_string(),
            prompt: build_nutrition_insights_prompt(plan, family_profiles),
            tool: None,
            model_class: ModelClass::Pro,
            max_output_tokens: FOLLOW_UP_MAX_OUTPUT_TOKENS,
        };

        let response = match self.provider.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Nutrition insights failed: {}", e);
                return NutritionInsightsResult::failure(format!(
                    "Failed to generate nutrition insights: {}",
                    e
                ));
            }
        };

        if response.is_empty() {
            return NutritionInsightsResult::failure("No valid insights generated");
        }

        match self.extraction.extract::<NutritionInsights>(&response) {
            Some((insights, _)) => NutritionInsightsResult::success(insights),
            None => NutritionInsightsResult::failure("Failed to parse nutrition insights"),
        }
    }
}

/// Builder for a planner backed by one provider
#[derive(Debug, Default)]
pub struct MealPlannerBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    fast_model: Option<String>,
    pro_model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl MealPlannerBuilder {
    /// Provider name, `"google"` (the default) or `"openai"`
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the API key directly instead of relying on environment variables
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Model used for the free and basic tiers
    pub fn fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = Some(model.into());
        self
    }

    /// Model used for the premium tiers
    pub fn pro_model(mut self, model: impl Into<String>) -> Self {
        self.pro_model = Some(model.into());
        self
    }

    /// Custom or proxy endpoint for the provider API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set a timeout for HTTP requests
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Build the planner
    ///
    /// # Errors
    /// Returns `MealPlanError` if the provider is unknown or no API key is
    /// available.
    pub fn build(self) -> Result<MealPlanner, MealPlanError> {
        let provider_name = self.provider.unwrap_or_else(|| "google".to_string());
        if provider_name.trim().is_empty() {
            return Err(MealPlanError::Builder(
                "Provider name cannot be empty".to_string(),
            ));
        }

        let config = ProviderConfig {
            fast_model: self.fast_model,
            pro_model: self.pro_model,
            api_key: self.api_key,
            base_url: self.base_url,
            ..ProviderConfig::default()
        };

        let provider = ProviderFactory::create(
            &provider_name,
            &config,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        Ok(MealPlanner::new(Box::new(ProviderChain::from_providers(
            vec![provider],
            DEFAULT_RETRY_ATTEMPTS,
            DEFAULT_RETRY_DELAY_MS,
        ))))
    }
}
