use crate::model::{Meal, MealPlanDocument};
use crate::preferences::Preferences;
use crate::schema::{example_document, meal_plan_schema};
use crate::tier::Tier;
use serde_json::Value;

/// System instruction sent with every meal plan request.
///
/// Loaded from `system_prompt.txt` at compile time so the wording can be
/// edited without touching Rust string syntax.
pub const MEAL_PLANNER_SYSTEM_PROMPT: &str = include_str!("system_prompt.txt");

/// System instruction for the smaller follow-up requests (swaps, shopping lists).
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a helpful meal planning assistant. \
Answer with a single JSON object only, without commentary before or after it.";

/// Everything needed to ask a model for a meal plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MealPlanPrompt {
    pub system: String,
    pub user: String,
    /// JSON Schema for tool/function calling. Text-only calls can ignore it;
    /// the user prompt already carries an example of the same shape.
    pub schema: Value,
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// Build the prompt for a normalised set of preferences.
///
/// Tier augmentation is cumulative: each tier adds lines on top of the ones
/// the tier below it gets.
pub fn build_meal_plan_prompt(prefs: &Preferences, tier: Tier) -> MealPlanPrompt {
    let profile = tier.profile();

    let mut lines = vec![
        "Generate a meal plan for a busy family with the following requirements:".to_string(),
        format!(
            "- Dietary restrictions: {}",
            list_or(&prefs.dietary_restrictions, "None")
        ),
        format!("- Allergies: {}", list_or(&prefs.allergies, "None")),
        format!("- Cooking time limit: {} minutes", prefs.cooking_time_limit),
        format!("- Family size: {} people", prefs.family_size),
    ];

    if profile.cuisine_preferences {
        lines.push(format!(
            "- Preferred cuisines: {}",
            list_or(&prefs.cuisine_types, "Any")
        ));
    }

    if profile.premium_guidance {
        lines.push(format!(
            "- Kid-friendly required: {}",
            if prefs.kid_friendly { "Yes" } else { "No" }
        ));
        lines.push(format!(
            "- Budget per week: {}",
            prefs
                .budget
                .map(|b| format!("${}", b))
                .unwrap_or_else(|| "Not specified".to_string())
        ));
        lines.push(format!(
            "- Calorie target: {}",
            prefs
                .calorie_target
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Not specified".to_string())
        ));
    }

    lines.push(String::new());

    if profile.days == 1 {
        lines.push(format!(
            "Create exactly {} meals (breakfast, lunch, dinner) for ONE day only.",
            profile.meals_per_day
        ));
        lines.push("Focus on simple, quick recipes that require minimal ingredients.".to_string());
    } else {
        lines.push(format!(
            "Create a complete {}-day meal plan with breakfast, lunch, and dinner for each day (Monday through Sunday).",
            profile.days
        ));
        lines.push(
            "Include variety to avoid repetition and consider meal prep opportunities.".to_string(),
        );
    }

    if profile.nutrition {
        lines.push(
            "Include nutritional information (calories, protein, carbs, fat) for every meal."
                .to_string(),
        );
    }

    if profile.premium_guidance {
        if prefs.kid_friendly {
            lines.push("Include kid-friendly options with hidden vegetables.".to_string());
        }
        lines.push("Suggest meal prep strategies and leftover usage.".to_string());
        lines.push("Include seasonal ingredients when possible.".to_string());
    }

    let example = example_document(tier, prefs.family_size);
    let example = serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string());

    lines.push(String::new());
    lines.push("Format the response as JSON with this structure:".to_string());
    lines.push(example);
    lines.push(String::new());
    lines.push("Return ONLY valid JSON, no additional text.".to_string());

    MealPlanPrompt {
        system: MEAL_PLANNER_SYSTEM_PROMPT.to_string(),
        user: lines.join("\n"),
        schema: meal_plan_schema(tier),
    }
}

/// Prompt asking for a replacement for a single meal.
pub fn build_swap_prompt(current: &Meal, prefs: &Preferences) -> String {
    let current_json = serde_json::to_string_pretty(current).unwrap_or_default();

    let mut lines = vec![
        "Suggest an alternative meal to replace:".to_string(),
        current_json,
        String::new(),
        "Requirements:".to_string(),
        "- Similar nutrition profile".to_string(),
        format!("- Same meal type ({})", current.meal_type),
        format!("- Prep time under {} minutes", current.prep_time + 5),
        format!(
            "- Dietary restrictions: {}",
            list_or(&prefs.dietary_restrictions, "None")
        ),
        format!("- Allergies: {}", list_or(&prefs.allergies, "None")),
        format!("- Servings: {}", prefs.family_size),
    ];

    if !prefs.cuisine_types.is_empty() {
        lines.push(format!(
            "- Preferred cuisines: {}",
            prefs.cuisine_types.join(", ")
        ));
    }

    lines.push(String::new());
    lines.push("Format as JSON with the same structure as the original meal.".to_string());
    lines.join("\n")
}

/// Prompt asking for a consolidated shopping list for a plan.
pub fn build_shopping_list_prompt(
    plan: &MealPlanDocument,
    pantry_items: &[String],
    tier: Tier,
) -> String {
    let ingredients: Vec<&crate::model::Ingredient> = plan.ingredients().collect();
    let ingredients_json = serde_json::to_string(&ingredients).unwrap_or_default();
    let with_costs = tier.is_premium();

    let mut lines = vec![
        "Generate a shopping list from these ingredients:".to_string(),
        ingredients_json,
        String::new(),
    ];

    if !pantry_items.is_empty() {
        lines.push(format!(
            "Items already in pantry: {}",
            pantry_items.join(", ")
        ));
        lines.push(String::new());
    }

    lines.push("Organize by store sections and combine quantities.".to_string());
    if with_costs {
        lines.push("Include estimated costs for each item.".to_string());
    }

    let item = if with_costs {
        r#"{ "name": "Tomatoes", "quantity": "2 lbs", "checked": false, "estimatedCost": 3.99 }"#
    } else {
        r#"{ "name": "Tomatoes", "quantity": "2 lbs", "checked": false }"#
    };
    let totals = if with_costs {
        ",\n  \"totalEstimatedCost\": 75.50,\n  \"savingsTips\": [\"Buy chicken in bulk\", \"Frozen vegetables are cheaper\"]"
    } else {
        ""
    };

    lines.push(String::new());
    lines.push("Format as JSON:".to_string());
    lines.push(format!(
        "{{\n  \"categories\": [\n    {{ \"name\": \"Produce\", \"items\": [{}] }}\n  ]{}\n}}",
        item, totals
    ));
    lines.join("\n")
}

const NUTRITION_INSIGHTS_FORMAT: &str = r#"{
  "overallAssessment": {
    "score": 85,
    "summary": "Well-balanced with room for improvement",
    "strengths": ["High protein", "Good variety"],
    "weaknesses": ["Low iron", "Needs more fiber"]
  },
  "macroDistribution": {
    "protein": { "percentage": 25, "status": "optimal" },
    "carbs": { "percentage": 45, "status": "balanced" },
    "fat": { "percentage": 30, "status": "balanced" }
  },
  "micronutrients": {
    "highlights": ["Vitamin C: 150% RDA", "Calcium: 120% RDA"],
    "concerns": ["Iron: 60% RDA", "Vitamin D: 40% RDA"]
  },
  "recommendations": [
    "Add more leafy greens for iron",
    "Include fortified dairy for Vitamin D"
  ],
  "familyInsights": [
    { "member": "Child 1", "insights": ["Getting enough calcium", "May need more iron-rich foods"] }
  ]
}"#;

/// Prompt asking for a nutritional review of a whole plan, with insights per
/// family member when profiles are given.
pub fn build_nutrition_insights_prompt(plan: &MealPlanDocument, family_profiles: &[Value]) -> String {
    let plan_json = serde_json::to_string(plan).unwrap_or_default();
    let profiles_json = serde_json::to_string(family_profiles).unwrap_or_default();

    [
        "Analyze the nutritional content of this weekly meal plan:".to_string(),
        plan_json,
        String::new(),
        format!("Family profiles: {}", profiles_json),
        String::new(),
        "Provide:".to_string(),
        "1. Overall nutrition assessment".to_string(),
        "2. Macro distribution analysis".to_string(),
        "3. Vitamin and mineral highlights".to_string(),
        "4. Recommendations for improvement".to_string(),
        "5. Family member specific insights".to_string(),
        String::new(),
        "Format as JSON:".to_string(),
        NUTRITION_INSIGHTS_FORMAT.to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MealType;
    use serde_json::json;

    fn prefs(raw: Value, tier: Tier) -> Preferences {
        Preferences::normalize(&raw, tier)
    }

    #[test]
    fn test_system_prompt_is_embedded() {
        assert!(!MEAL_PLANNER_SYSTEM_PROMPT.is_empty());
        assert!(MEAL_PLANNER_SYSTEM_PROMPT.contains("nutritionist"));
        assert!(MEAL_PLANNER_SYSTEM_PROMPT.contains("createMealPlan"));
    }

    #[test]
    fn test_base_lines_always_present() {
        for tier in Tier::ALL {
            let prompt = build_meal_plan_prompt(&Preferences::default(), tier);
            assert!(prompt.user.contains("- Dietary restrictions: None"));
            assert!(prompt.user.contains("- Allergies: None"));
            assert!(prompt.user.contains("- Cooking time limit: 30 minutes"));
            assert!(prompt.user.contains("- Family size: 2 people"));
        }
    }

    #[test]
    fn test_free_scenario_prompt() {
        let raw = json!({ "dietaryRestrictions": ["vegan", "keto", "paleo"], "familySize": 4 });
        let p = prefs(raw, Tier::Free);
        let prompt = build_meal_plan_prompt(&p, Tier::Free);

        assert!(prompt.user.contains("- Dietary restrictions: vegan\n"));
        assert!(prompt.user.contains("exactly 3 meals"));
        assert!(prompt.user.contains("ONE day only"));
        assert!(prompt.user.contains("minimal ingredients"));
        assert!(!prompt.user.contains("Preferred cuisines"));
        assert!(!prompt.user.contains("7-day"));
        assert!(!prompt.user.contains("\"nutrition\""));
        assert_eq!(prompt.schema["properties"]["days"]["maxItems"], 1);
    }

    #[test]
    fn test_basic_prompt() {
        let p = prefs(json!({ "cuisineTypes": ["thai", "mexican"] }), Tier::Basic);
        let prompt = build_meal_plan_prompt(&p, Tier::Basic);

        assert!(prompt.user.contains("- Preferred cuisines: thai, mexican"));
        assert!(prompt.user.contains("7-day meal plan"));
        assert!(prompt.user.contains("meal prep opportunities"));
        assert!(!prompt.user.contains("Kid-friendly required"));
        assert!(!prompt.user.contains("kidFriendlyTips"));
    }

    #[test]
    fn test_premium_scenario_prompt() {
        let raw = json!({
            "dietaryRestrictions": ["vegan", "keto", "paleo"],
            "familySize": 4,
            "kidFriendly": true,
            "budget": 200,
            "calorieTarget": 1800
        });
        let p = prefs(raw, Tier::Premium);
        let prompt = build_meal_plan_prompt(&p, Tier::Premium);

        assert!(prompt.user.contains("- Dietary restrictions: vegan, keto, paleo"));
        assert!(prompt.user.contains("7-day meal plan"));
        assert!(prompt.user.contains("- Kid-friendly required: Yes"));
        assert!(prompt.user.contains("- Budget per week: $200"));
        assert!(prompt.user.contains("- Calorie target: 1800"));
        assert!(prompt.user.contains("nutritional information"));
        assert!(prompt.user.contains("hidden vegetables"));
        assert!(prompt.user.contains("leftover usage"));
        assert!(prompt.user.contains("seasonal ingredients"));
        assert!(prompt.user.contains("\"kidFriendlyTips\""));
        assert!(prompt.user.contains("\"servings\": 4"));
        assert!(prompt.schema["properties"]["days"]["items"]["properties"]["meals"]["items"]
            ["properties"]
            .get("kidFriendlyTips")
            .is_some());
    }

    #[test]
    fn test_premium_without_optional_values() {
        let prompt = build_meal_plan_prompt(&Preferences::default(), Tier::PremiumPlus);
        assert!(prompt.user.contains("- Kid-friendly required: No"));
        assert!(prompt.user.contains("- Budget per week: Not specified"));
        assert!(prompt.user.contains("- Calorie target: Not specified"));
        assert!(!prompt.user.contains("hidden vegetables"));
    }

    #[test]
    fn test_prompt_lines_are_cumulative() {
        let p = Preferences::default();
        for pair in Tier::ALL.windows(2) {
            let lower = build_meal_plan_prompt(&p, pair[0]).user;
            let higher = build_meal_plan_prompt(&p, pair[1]).user;
            for line in lower.lines().filter(|l| l.starts_with("- ")) {
                assert!(
                    higher.contains(line),
                    "{} prompt lost requirement line {:?}",
                    pair[1],
                    line
                );
            }
        }
    }

    #[test]
    fn test_swap_prompt() {
        let meal: Meal = serde_json::from_value(json!({
            "type": "lunch",
            "name": "Quinoa Salad",
            "prepTime": 15
        }))
        .unwrap();
        let p = prefs(json!({ "allergies": ["nuts"] }), Tier::Basic);
        let prompt = build_swap_prompt(&meal, &p);
        assert_eq!(meal.meal_type, MealType::Lunch);
        assert!(prompt.contains("Quinoa Salad"));
        assert!(prompt.contains("Same meal type (lunch)"));
        assert!(prompt.contains("Prep time under 20 minutes"));
        assert!(prompt.contains("- Allergies: nuts"));
    }

    #[test]
    fn test_shopping_list_prompt_costs_are_premium_only() {
        let plan = crate::fallback::fallback_document(Tier::Free);
        let pantry = vec!["olive oil".to_string()];

        let basic = build_shopping_list_prompt(&plan, &pantry, Tier::Basic);
        assert!(basic.contains("chickpeas"));
        assert!(basic.contains("Items already in pantry: olive oil"));
        assert!(!basic.contains("estimatedCost"));

        let premium = build_shopping_list_prompt(&plan, &[], Tier::Premium);
        assert!(premium.contains("estimatedCost"));
        assert!(premium.contains("totalEstimatedCost"));
        assert!(!premium.contains("Items already in pantry"));
    }

    #[test]
    fn test_nutrition_insights_prompt() {
        let plan = crate::fallback::fallback_document(Tier::Premium);
        let family = vec![json!({ "name": "Maya", "age": 7 })];

        let prompt = build_nutrition_insights_prompt(&plan, &family);
        assert!(prompt.starts_with("Analyze the nutritional content"));
        assert!(prompt.contains("Greek Yogurt Parfait"));
        assert!(prompt.contains(r#""name":"Maya""#));
        assert!(prompt.contains("familyInsights"));

        let without_family = build_nutrition_insights_prompt(&plan, &[]);
        assert!(without_family.contains("Family profiles: []"));
    }
}
