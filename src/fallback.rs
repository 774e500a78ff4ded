//! Static meal plan returned whenever a model response cannot be turned into
//! a document. The nutrition figures are placeholders keyed by meal type, not
//! computed from the ingredients.

use crate::model::{Day, Ingredient, Meal, MealPlanDocument, MealType, Nutrition};
use crate::preferences::DEFAULT_FAMILY_SIZE;
use crate::tier::Tier;
use serde_json::Map;

/// Value of `GenerationResult::model` when the fallback document is served.
pub const FALLBACK_MODEL: &str = "fallback";

const FALLBACK_INSTRUCTIONS: [&str; 3] = [
    "Gather all ingredients",
    "Prepare ingredients as needed",
    "Combine and serve",
];

const FALLBACK_ALTERNATIVES: [&str; 2] = [
    "For dairy-free: Use coconut yogurt",
    "For gluten-free: Use gluten-free granola",
];

/// Placeholder figures; breakfast is lighter than lunch, lunch than dinner.
fn placeholder_nutrition(meal_type: MealType) -> Nutrition {
    let (calories, protein, carbs, fat) = match meal_type {
        MealType::Breakfast => (350.0, 15.0, 40.0, 12.0),
        MealType::Lunch => (450.0, 20.0, 45.0, 15.0),
        MealType::Dinner => (550.0, 30.0, 35.0, 18.0),
    };
    Nutrition {
        calories,
        protein,
        carbs,
        fat,
    }
}

fn meal(
    meal_type: MealType,
    name: &str,
    description: &str,
    prep_time: u32,
    tags: &[&str],
    ingredients: Vec<Ingredient>,
) -> Meal {
    Meal {
        meal_type,
        name: name.to_string(),
        description: description.to_string(),
        prep_time,
        cook_time: None,
        servings: DEFAULT_FAMILY_SIZE,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ingredients,
        nutrition: None,
        kid_friendly_tips: None,
        meal_prep_tips: None,
        leftover_ideas: None,
        instructions: Vec::new(),
        alternatives: Vec::new(),
        extra: Map::new(),
    }
}

fn base_meals() -> Vec<Meal> {
    vec![
        meal(
            MealType::Breakfast,
            "Greek Yogurt Parfait",
            "Greek yogurt with honey, berries, and granola",
            5,
            &["vegetarian", "kid-friendly"],
            vec![
                Ingredient::new("Greek yogurt", "1 cup", "dairy"),
                Ingredient::new("honey", "1 tbsp", "pantry"),
                Ingredient::new("mixed berries", "1/2 cup", "produce"),
                Ingredient::new("granola", "1/4 cup", "grains"),
            ],
        ),
        meal(
            MealType::Lunch,
            "Mediterranean Chickpea Bowl",
            "Chickpeas, cucumber, tomato, feta, and olive oil",
            15,
            &["vegetarian", "make-ahead"],
            vec![
                Ingredient::new("chickpeas", "1 can", "pantry"),
                Ingredient::new("cucumber", "1", "produce"),
                Ingredient::new("tomato", "2", "produce"),
                Ingredient::new("feta cheese", "1/4 cup", "dairy"),
                Ingredient::new("olive oil", "2 tbsp", "pantry"),
            ],
        ),
        meal(
            MealType::Dinner,
            "Sheet Pan Chicken & Veggies",
            "Chicken breast, bell peppers, broccoli, and olive oil",
            20,
            &["kid-friendly", "one-pan"],
            vec![
                Ingredient::new("chicken breast", "1 lb", "protein"),
                Ingredient::new("bell peppers", "2", "produce"),
                Ingredient::new("broccoli", "1 head", "produce"),
                Ingredient::new("olive oil", "2 tbsp", "pantry"),
                Ingredient::new("garlic", "2 cloves", "produce"),
            ],
        ),
    ]
}

/// The fallback plan for a tier: always one day (Monday) with breakfast,
/// lunch and dinner. Premium tiers also get placeholder nutrition, basic
/// instructions and allergy alternatives on every meal.
pub fn fallback_document(tier: Tier) -> MealPlanDocument {
    let mut meals = base_meals();

    if tier.is_premium() {
        for meal in &mut meals {
            meal.nutrition = Some(placeholder_nutrition(meal.meal_type));
            meal.instructions = FALLBACK_INSTRUCTIONS.iter().map(|s| s.to_string()).collect();
            meal.alternatives = FALLBACK_ALTERNATIVES.iter().map(|s| s.to_string()).collect();
        }
    }

    MealPlanDocument::new(vec![Day::new("Monday", meals)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_day_three_meals_for_every_tier() {
        for tier in Tier::ALL {
            let doc = fallback_document(tier);
            assert_eq!(doc.days.len(), 1, "tier {}", tier);
            assert_eq!(doc.days[0].day, "Monday");
            let types: Vec<MealType> = doc.days[0].meals.iter().map(|m| m.meal_type).collect();
            assert_eq!(types, MealType::ALL.to_vec());
        }
    }

    #[test]
    fn test_nutrition_only_for_premium() {
        for tier in [Tier::Free, Tier::Basic] {
            let doc = fallback_document(tier);
            assert!(doc.days[0].meals.iter().all(|m| m.nutrition.is_none()));
            assert!(doc.days[0].meals.iter().all(|m| m.instructions.is_empty()));
        }
        for tier in [Tier::Premium, Tier::PremiumPlus] {
            let doc = fallback_document(tier);
            assert!(doc.days[0].meals.iter().all(|m| m.nutrition.is_some()));
            assert!(doc.days[0].meals.iter().all(|m| m.alternatives.len() == 2));
        }
    }

    #[test]
    fn test_calories_increase_through_the_day() {
        let doc = fallback_document(Tier::Premium);
        let calories: Vec<f64> = doc.days[0]
            .meals
            .iter()
            .map(|m| m.nutrition.unwrap().calories)
            .collect();
        assert_eq!(calories, vec![350.0, 450.0, 550.0]);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_document(Tier::Basic), fallback_document(Tier::Basic));
    }
}
