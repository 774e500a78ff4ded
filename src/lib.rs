pub mod config;
pub mod error;
pub mod extractors;
pub mod fallback;
pub mod model;
mod planner;
pub mod preferences;
pub mod prompt;
pub mod providers;
pub mod schema;
pub mod tier;

use log::error;
use serde_json::Value;

pub use config::{load_config, AiConfig, ChainConfig, ProviderConfig};
pub use error::MealPlanError;
pub use fallback::fallback_document;
pub use model::{
    Day, GenerationResult, Ingredient, Meal, MealPlanDocument, MealType, Nutrition,
    NutritionInsights, NutritionInsightsResult, ShoppingList, ShoppingListResult, SwapResult,
    WeeklyNutrition,
};
pub use planner::{MealPlanner, MealPlannerBuilder};
pub use preferences::Preferences;
pub use prompt::{build_meal_plan_prompt, MealPlanPrompt};
pub use providers::LlmProvider;
pub use schema::meal_plan_schema;
pub use tier::{ModelClass, Tier, TierProfile};

/// Message returned when no provider can be set up from the configuration.
pub const CONFIGURATION_ERROR: &str = "Server configuration error";

/// Generate a meal plan using the providers described by `config`.
///
/// Never fails. Missing credentials or an unusable provider configuration
/// give `{ success: false, error: "Server configuration error" }`; every other
/// outcome is described on [`MealPlanner::generate`].
pub async fn generate_meal_plan(config: &AiConfig, preferences: &Value, tier: Tier) -> GenerationResult {
    match MealPlanner::from_config(config) {
        Ok(planner) => planner.generate(preferences, tier).await,
        Err(e) if e.is_configuration() => {
            error!("Failed to set up meal planner: {}", e);
            GenerationResult::failure(CONFIGURATION_ERROR)
        }
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            GenerationResult::failure(format!("Failed to generate meal plan: {}", e))
        }
    }
}
