//! Recovery of structured documents from model responses.
//!
//! Strategies run in a fixed order and the first one whose candidate both
//! parses as JSON and deserializes into the requested type wins. The document
//! types are lenient, so for a meal plan that means any object with a `days`
//! list. Nothing in this module returns an error; a response no strategy can
//! read simply yields no match.

use crate::fallback::fallback_document;
use crate::model::MealPlanDocument;
use crate::providers::ModelResponse;
use crate::tier::Tier;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

mod bracket_span;
mod fenced_json;
mod repaired;
mod tool_call;

pub use self::bracket_span::BracketSpanExtractor;
pub use self::fenced_json::FencedJsonExtractor;
pub use self::repaired::RepairedTextExtractor;
pub use self::tool_call::ToolCallExtractor;

pub trait Extractor: Send + Sync {
    /// Short name reported when this strategy produced the document
    fn name(&self) -> &'static str;

    /// Candidate JSON value, if this strategy can find one
    fn parse(&self, response: &ModelResponse) -> Option<Value>;
}

/// Outcome of extracting a meal plan from a response.
#[derive(Debug, Clone, PartialEq)]
pub struct MealPlanExtraction {
    pub document: MealPlanDocument,
    /// Strategy that produced the document, `None` when the fallback was used
    pub strategy: Option<&'static str>,
}

impl MealPlanExtraction {
    pub fn is_fallback(&self) -> bool {
        self.strategy.is_none()
    }
}

pub struct ExtractionChain {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractionChain {
    fn default() -> Self {
        ExtractionChain {
            extractors: vec![
                Box::new(ToolCallExtractor),
                Box::new(FencedJsonExtractor),
                Box::new(BracketSpanExtractor),
                Box::new(RepairedTextExtractor),
            ],
        }
    }
}

impl ExtractionChain {
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Self {
        ExtractionChain { extractors }
    }

    /// Names of the strategies, in the order they are tried
    pub fn strategies(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// First strategy result that deserializes into `T`, with the name of the
    /// strategy that produced it.
    pub fn extract<T: DeserializeOwned>(&self, response: &ModelResponse) -> Option<(T, &'static str)> {
        for extractor in &self.extractors {
            let Some(value) = extractor.parse(response) else {
                continue;
            };

            match serde_json::from_value::<T>(value) {
                Ok(parsed) => {
                    debug!("Extracted response with {}", extractor.name());
                    return Some((parsed, extractor.name()));
                }
                Err(e) => {
                    debug!("{} found JSON of the wrong shape: {}", extractor.name(), e);
                }
            }
        }

        None
    }

    /// Meal plan for a tier: the extracted document, or the tier's fallback
    /// document when nothing matches. Tiers limited to a single day are
    /// truncated here, whatever the model returned.
    pub fn extract_meal_plan(&self, response: &ModelResponse, tier: Tier) -> MealPlanExtraction {
        let (mut document, strategy) = match self.extract::<MealPlanDocument>(response) {
            Some((document, name)) => (document, Some(name)),
            None => {
                info!("No meal plan found in model response, using fallback document");
                (fallback_document(tier), None)
            }
        };

        if tier.profile().truncate_to_single_day && document.days.len() > 1 {
            debug!("Truncating {} days to one for {} tier", document.days.len(), tier);
            document.days.truncate(1);
        }

        MealPlanExtraction { document, strategy }
    }
}

/// Parse a candidate string, logging rather than propagating failures.
pub(crate) fn parse_candidate(strategy: &str, candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{} candidate is not valid JSON: {}", strategy, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MealType;
    use crate::providers::ToolCall;
    use serde_json::json;

    fn day(name: &str) -> Value {
        json!({
            "day": name,
            "meals": [{
                "type": "breakfast",
                "name": "Oatmeal",
                "description": "Warm oats",
                "prepTime": 10,
                "servings": 2,
                "tags": [],
                "ingredients": [{ "name": "oats", "amount": "1 cup", "category": "grains" }]
            }]
        })
    }

    fn week() -> Value {
        let days: Vec<Value> = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
            .iter()
            .map(|d| day(d))
            .collect();
        json!({ "days": days })
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            ExtractionChain::default().strategies(),
            vec!["tool_call", "fenced_json", "bracket_span", "repaired"]
        );
    }

    #[test]
    fn test_tool_call_wins_over_text() {
        let response = ModelResponse {
            text: Some(json!({ "days": [day("Friday")] }).to_string()),
            tool_call: Some(ToolCall {
                name: "createMealPlan".to_string(),
                arguments: json!({ "days": [day("Monday")] }),
            }),
            model: "m".to_string(),
        };

        let extraction = ExtractionChain::default().extract_meal_plan(&response, Tier::Basic);
        assert_eq!(extraction.strategy, Some("tool_call"));
        assert_eq!(extraction.document.days[0].day, "Monday");
    }

    #[test]
    fn test_fenced_round_trip() {
        let written = week();
        let text = format!(
            "Here is your plan:\n```json\n{}\n```\nEnjoy!",
            serde_json::to_string_pretty(&written).unwrap()
        );

        let extraction = ExtractionChain::default()
            .extract_meal_plan(&ModelResponse::from_text(text, "m"), Tier::Basic);

        assert_eq!(extraction.strategy, Some("fenced_json"));
        let expected: MealPlanDocument = serde_json::from_value(written).unwrap();
        assert_eq!(extraction.document, expected);
    }

    #[test]
    fn test_not_json_at_all_falls_back() {
        for tier in Tier::ALL {
            let extraction = ExtractionChain::default()
                .extract_meal_plan(&ModelResponse::from_text("not json at all", "m"), tier);
            assert!(extraction.is_fallback());
            assert_eq!(extraction.document, fallback_document(tier));
        }
    }

    #[test]
    fn test_empty_response_falls_back() {
        let extraction =
            ExtractionChain::default().extract_meal_plan(&ModelResponse::default(), Tier::Premium);
        assert!(extraction.is_fallback());
        assert!(extraction.document.days[0].meals[0].nutrition.is_some());
    }

    #[test]
    fn test_json_without_days_falls_back() {
        let response = ModelResponse::from_text(r#"{"plan": "none"}"#, "m");
        let extraction = ExtractionChain::default().extract_meal_plan(&response, Tier::Basic);
        assert!(extraction.is_fallback());
    }

    #[test]
    fn test_free_tier_is_truncated_to_one_day() {
        let response = ModelResponse::from_text(week().to_string(), "m");

        let free = ExtractionChain::default().extract_meal_plan(&response, Tier::Free);
        assert_eq!(free.document.days.len(), 1);
        assert_eq!(free.document.days[0].day, "Monday");
        assert!(!free.is_fallback());

        let basic = ExtractionChain::default().extract_meal_plan(&response, Tier::Basic);
        assert_eq!(basic.document.days.len(), 7);
    }

    #[test]
    fn test_basic_plain_text_gets_single_day_fallback() {
        let response = ModelResponse::from_text(
            "I'm sorry, I can't help with that meal plan today.",
            "gemini-2.5-flash",
        );
        let extraction = ExtractionChain::default().extract_meal_plan(&response, Tier::Basic);

        assert!(extraction.is_fallback());
        assert_eq!(extraction.document.days.len(), 1);
        let types: Vec<MealType> = extraction.document.days[0]
            .meals
            .iter()
            .map(|m| m.meal_type)
            .collect();
        assert_eq!(types, MealType::ALL.to_vec());
    }

    fn fenced(plan: &Value) -> ModelResponse {
        ModelResponse::from_text(format!("```json\n{}\n```", plan), "m")
    }

    #[test]
    fn test_unknown_meal_type_keeps_the_week() {
        let mut plan = week();
        plan["days"][2]["meals"][0]["type"] = json!("snack");

        let extraction = ExtractionChain::default().extract_meal_plan(&fenced(&plan), Tier::Basic);
        assert_eq!(extraction.strategy, Some("fenced_json"));
        assert_eq!(extraction.document.days.len(), 7);
        assert!(extraction.document.days[2].meals.is_empty());
        assert_eq!(extraction.document.meal_count(), 6);
    }

    #[test]
    fn test_one_mistyped_field_keeps_the_week() {
        let mut cost = week();
        cost["estimatedCost"] = json!("$150-200");
        let mut calories = week();
        calories["days"][4]["meals"][0]["nutrition"] =
            json!({ "calories": "450 kcal", "protein": 20, "carbs": 40, "fat": 10 });
        let mut prep_plan = week();
        prep_plan["mealPrepPlan"] = json!({ "sunday": ["cook grains"] });

        for (tier, plan) in [(Tier::Premium, cost), (Tier::Basic, calories), (Tier::PremiumPlus, prep_plan)] {
            let extraction = ExtractionChain::default().extract_meal_plan(&fenced(&plan), tier);
            assert!(!extraction.is_fallback(), "{} plan fell back", tier);
            assert_eq!(extraction.document.days.len(), 7);
        }
    }

    #[test]
    fn test_extra_meal_fields_round_trip() {
        let mut plan = week();
        plan["days"][0]["meals"][0]["difficulty"] = json!("easy");

        let extraction = ExtractionChain::default().extract_meal_plan(&fenced(&plan), Tier::Basic);
        let written = serde_json::to_value(&extraction.document).unwrap();
        assert_eq!(written, plan);
    }

    #[test]
    fn test_extract_other_types() {
        let response = ModelResponse::from_text(
            r#"Sure! {"categories": [{"name": "Produce", "items": [{"name": "tomato", "quantity": "3"}]}]}"#,
            "m",
        );
        let (list, strategy) = ExtractionChain::default()
            .extract::<crate::model::ShoppingList>(&response)
            .unwrap();
        assert_eq!(strategy, "bracket_span");
        assert_eq!(list.categories[0].items[0].name, "tomato");
    }

    #[test]
    fn test_shopping_list_with_cost_strings() {
        let response = ModelResponse::from_text(
            r#"{"categories": [{"name": "Produce", "items": [{"name": "tomato", "quantity": "3", "estimatedCost": "$3.99"}]}], "totalEstimatedCost": "$42"}"#,
            "m",
        );
        let (list, _) = ExtractionChain::default()
            .extract::<crate::model::ShoppingList>(&response)
            .unwrap();
        assert_eq!(list.categories[0].items[0].estimated_cost, Some(3.99));
        assert_eq!(list.total_estimated_cost, Some(42.0));
    }
}
