//! Output schema for meal plans.
//!
//! The schema is assembled field group by field group from the tier table,
//! so a higher tier always asks for everything a lower tier asks for.

use crate::tier::Tier;
use serde_json::{json, Map, Value};

pub const TOOL_NAME: &str = "createMealPlan";
pub const TOOL_DESCRIPTION: &str = "Creates a structured meal plan based on user preferences";

fn string() -> Value {
    json!({ "type": "string" })
}

fn integer() -> Value {
    json!({ "type": "integer" })
}

fn number() -> Value {
    json!({ "type": "number" })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn object(properties: Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn nutrition_schema() -> Value {
    let mut props = Map::new();
    for key in ["calories", "protein", "carbs", "fat"] {
        props.insert(key.to_string(), number());
    }
    object(props, &["calories", "protein", "carbs", "fat"])
}

fn meal_schema(tier: Tier) -> Value {
    let profile = tier.profile();
    let mut props = Map::new();

    props.insert(
        "type".to_string(),
        json!({ "type": "string", "enum": ["breakfast", "lunch", "dinner"] }),
    );
    props.insert("name".to_string(), string());
    props.insert("description".to_string(), string());
    props.insert("prepTime".to_string(), integer());
    props.insert("servings".to_string(), integer());
    props.insert("tags".to_string(), array_of(string()));

    let mut ingredient = Map::new();
    ingredient.insert("name".to_string(), string());
    ingredient.insert("amount".to_string(), string());
    ingredient.insert("category".to_string(), string());
    props.insert(
        "ingredients".to_string(),
        array_of(object(ingredient, &["name", "amount"])),
    );

    if profile.nutrition {
        props.insert("nutrition".to_string(), nutrition_schema());
    }

    if profile.premium_guidance {
        props.insert("kidFriendlyTips".to_string(), string());
        props.insert("mealPrepTips".to_string(), string());
        props.insert("leftoverIdeas".to_string(), string());
    }

    object(props, &["type", "name", "description", "ingredients"])
}

/// JSON Schema for the tool/function declaration of a meal plan request.
pub fn meal_plan_schema(tier: Tier) -> Value {
    let profile = tier.profile();

    let mut meals = array_of(meal_schema(tier));
    meals["minItems"] = json!(profile.meals_per_day);
    meals["maxItems"] = json!(profile.meals_per_day);

    let mut day = Map::new();
    day.insert("day".to_string(), string());
    day.insert("meals".to_string(), meals);

    let mut days = array_of(object(day, &["day", "meals"]));
    days["minItems"] = json!(profile.days);
    days["maxItems"] = json!(profile.days);

    let mut plan = Map::new();
    plan.insert("days".to_string(), days);

    if profile.premium_guidance {
        let mut weekly = Map::new();
        for key in ["avgCalories", "avgProtein", "avgCarbs", "avgFat"] {
            weekly.insert(key.to_string(), number());
        }
        plan.insert("weeklyNutrition".to_string(), object(weekly, &[]));
        plan.insert("mealPrepPlan".to_string(), string());
        plan.insert("estimatedCost".to_string(), number());
    }

    object(plan, &["days"])
}

/// Example document embedded in text prompts, shaped by the same tier rules
/// as [`meal_plan_schema`].
pub fn example_document(tier: Tier, family_size: u32) -> Value {
    let profile = tier.profile();

    let mut meal = json!({
        "type": "breakfast",
        "name": "Meal name",
        "description": "Brief description",
        "prepTime": 15,
        "servings": family_size,
        "tags": ["tag1", "tag2"],
        "ingredients": [
            { "name": "ingredient1", "amount": "1 cup", "category": "produce" }
        ]
    });

    if profile.nutrition {
        meal["nutrition"] = json!({ "calories": 350, "protein": 20, "carbs": 45, "fat": 12 });
    }

    if profile.premium_guidance {
        meal["kidFriendlyTips"] = json!("How to make it appealing to kids");
        meal["mealPrepTips"] = json!("Can be prepped ahead");
        meal["leftoverIdeas"] = json!("Use leftovers for tomorrow's lunch");
    }

    let mut plan = json!({
        "days": [{ "day": "Monday", "meals": [meal] }]
    });

    if profile.premium_guidance {
        plan["weeklyNutrition"] = json!({
            "avgCalories": 1800,
            "avgProtein": 75,
            "avgCarbs": 200,
            "avgFat": 65
        });
        plan["mealPrepPlan"] = json!("Sunday prep suggestions");
        plan["estimatedCost"] = json!(150);
    }

    plan
}

/// Dotted property paths declared by a schema, e.g. `days[].meals[].name`.
pub fn property_paths(schema: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(schema, "", &mut paths);
    paths.sort();
    paths
}

fn collect_paths(schema: &Value, prefix: &str, paths: &mut Vec<String>) {
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (key, child) in props {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            paths.push(path.clone());
            collect_paths(child, &path, paths);
        }
    }

    if let Some(items) = schema.get("items") {
        collect_paths(items, &format!("{}[]", prefix), paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn paths(tier: Tier) -> BTreeSet<String> {
        property_paths(&meal_plan_schema(tier)).into_iter().collect()
    }

    #[test]
    fn test_base_schema_fields() {
        let free = paths(Tier::Free);
        for field in [
            "days",
            "days[].day",
            "days[].meals",
            "days[].meals[].type",
            "days[].meals[].name",
            "days[].meals[].description",
            "days[].meals[].prepTime",
            "days[].meals[].servings",
            "days[].meals[].tags",
            "days[].meals[].ingredients",
            "days[].meals[].ingredients[].name",
            "days[].meals[].ingredients[].amount",
            "days[].meals[].ingredients[].category",
        ] {
            assert!(free.contains(field), "missing {}", field);
        }
        assert!(!free.contains("days[].meals[].nutrition"));
    }

    #[test]
    fn test_schema_is_monotonic_in_tier() {
        for (i, lower) in Tier::ALL.iter().enumerate() {
            for higher in &Tier::ALL[i..] {
                let (lo, hi) = (paths(*lower), paths(*higher));
                assert!(
                    lo.is_subset(&hi),
                    "{} asks for fields {} does not: {:?}",
                    lower,
                    higher,
                    lo.difference(&hi).collect::<Vec<_>>()
                );
            }
        }
    }

    #[test]
    fn test_nutrition_from_basic() {
        assert!(paths(Tier::Basic).contains("days[].meals[].nutrition.calories"));
        assert!(!paths(Tier::Basic).contains("days[].meals[].kidFriendlyTips"));
    }

    #[test]
    fn test_premium_fields() {
        let premium = paths(Tier::Premium);
        for field in [
            "days[].meals[].kidFriendlyTips",
            "days[].meals[].mealPrepTips",
            "days[].meals[].leftoverIdeas",
            "weeklyNutrition",
            "mealPrepPlan",
            "estimatedCost",
        ] {
            assert!(premium.contains(field), "missing {}", field);
        }
        assert_eq!(premium, paths(Tier::PremiumPlus));
    }

    #[test]
    fn test_day_count_bounds() {
        let free = meal_plan_schema(Tier::Free);
        assert_eq!(free["properties"]["days"]["maxItems"], 1);
        let basic = meal_plan_schema(Tier::Basic);
        assert_eq!(basic["properties"]["days"]["minItems"], 7);
    }

    #[test]
    fn test_example_document_matches_schema_fields() {
        for tier in Tier::ALL {
            let example = example_document(tier, 2);
            let meal = &example["days"][0]["meals"][0];
            assert_eq!(meal.get("nutrition").is_some(), tier.profile().nutrition);
            assert_eq!(
                meal.get("kidFriendlyTips").is_some(),
                tier.profile().premium_guidance
            );
            assert_eq!(
                example.get("estimatedCost").is_some(),
                tier.profile().premium_guidance
            );
        }
    }

    #[test]
    fn test_example_document_parses_as_plan() {
        let example = example_document(Tier::PremiumPlus, 4);
        let doc: crate::model::MealPlanDocument = serde_json::from_value(example).unwrap();
        assert_eq!(doc.days[0].meals[0].servings, 4);
        assert!(doc.weekly_nutrition.is_some());
    }
}
