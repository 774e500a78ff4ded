use log::debug;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A generated meal plan: an ordered list of days plus optional plan-level
/// extras that only premium prompts ask for.
///
/// Only `days` has to be an array. Anything else the model gets wrong is
/// dropped field by field, and fields this type does not know are kept in
/// `extra` so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanDocument {
    #[serde(deserialize_with = "required_list")]
    pub days: Vec<Day>,
    #[serde(
        default,
        deserialize_with = "lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub weekly_nutrition: Option<WeeklyNutrition>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub meal_prep_plan: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_cost: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MealPlanDocument {
    pub fn new(days: Vec<Day>) -> Self {
        MealPlanDocument {
            days,
            weekly_nutrition: None,
            meal_prep_plan: None,
            estimated_cost: None,
            extra: Map::new(),
        }
    }

    /// Total number of meals across all days.
    pub fn meal_count(&self) -> usize {
        self.days.iter().map(|d| d.meals.len()).sum()
    }

    /// Every ingredient of every meal, in plan order.
    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.days
            .iter()
            .flat_map(|d| d.meals.iter())
            .flat_map(|m| m.ingredients.iter())
    }
}

/// One day of a plan. Meals that cannot be read, including meals of a type
/// other than breakfast, lunch or dinner, are left out of `meals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default, deserialize_with = "lenient_string")]
    pub day: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub meals: Vec<Meal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Day {
    pub fn new(day: impl Into<String>, meals: Vec<Meal>) -> Self {
        Day {
            day: day.into(),
            meals,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(rename = "type")]
    pub meal_type: MealType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub prep_time: u32,
    #[serde(
        default,
        deserialize_with = "lenient_opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub cook_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub servings: u32,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub ingredients: Vec<Ingredient>,
    #[serde(
        default,
        deserialize_with = "lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub nutrition: Option<Nutrition>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kid_friendly_tips: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub meal_prep_tips: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub leftover_ideas: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub instructions: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub alternatives: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Models are inconsistent about capitalisation ("Breakfast", "DINNER").
impl<'de> Deserialize<'de> for MealType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            other => Err(de::Error::unknown_variant(
                other,
                &["breakfast", "lunch", "dinner"],
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
    pub category: String,
}

impl Ingredient {
    pub fn new(name: &str, amount: &str, category: &str) -> Self {
        Ingredient {
            name: name.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
        }
    }
}

// Older prompts ask for `"ingredients": ["chickpeas", ...]`, so a bare string
// is accepted as an ingredient with only a name.
impl<'de> Deserialize<'de> for Ingredient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Full {
            name: String,
            #[serde(default, deserialize_with = "lenient_string")]
            amount: String,
            #[serde(default, deserialize_with = "lenient_string")]
            category: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full(Full),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => Ingredient {
                name,
                amount: String::new(),
                category: String::new(),
            },
            Repr::Full(full) => Ingredient {
                name: full.name,
                amount: full.amount,
                category: full.category,
            },
        })
    }
}

/// Per-meal macros. Values such as `"450 kcal"` or `"20g"` are read as their
/// leading number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyNutrition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_calories: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_fat: f64,
}

/// Consolidated shopping list for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    #[serde(deserialize_with = "required_list")]
    pub categories: Vec<ShoppingCategory>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_estimated_cost: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub savings_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingCategory {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<ShoppingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub checked: bool,
    /// Price in the user's currency; `"$3.99"` is read as 3.99
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_cost: Option<f64>,
}

/// Nutritionist-style review of a whole plan, for premium tiers.
///
/// A value counts as insights when it has an `overallAssessment` object;
/// every other section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInsights {
    pub overall_assessment: OverallAssessment,
    #[serde(
        default,
        deserialize_with = "lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub macro_distribution: Option<MacroDistribution>,
    #[serde(
        default,
        deserialize_with = "lenient_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub micronutrients: Option<Micronutrients>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub family_insights: Vec<FamilyInsight>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallAssessment {
    /// 0 to 100
    #[serde(
        default,
        deserialize_with = "lenient_opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroDistribution {
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub protein: Option<MacroShare>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub carbs: Option<MacroShare>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub fat: Option<MacroShare>,
}

/// Share of calories from one macro, e.g. `{ "percentage": 25, "status": "optimal" }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroShare {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Micronutrients {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub highlights: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyInsight {
    #[serde(default, deserialize_with = "lenient_string")]
    pub member: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub insights: Vec<String>,
}

/// Outcome of a meal plan request as seen by the caller.
///
/// Output-shape problems never show up here as failures: they resolve to the
/// fallback document with `success == true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_plan: Option<MealPlanDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationResult {
    pub fn success(meal_plan: MealPlanDocument, model: impl Into<String>) -> Self {
        GenerationResult {
            success: true,
            meal_plan: Some(meal_plan),
            error: None,
            model: Some(model.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        GenerationResult {
            success: false,
            meal_plan: None,
            error: Some(error.into()),
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal: Option<Meal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SwapResult {
    pub fn success(meal: Meal) -> Self {
        SwapResult {
            success: true,
            meal: Some(meal),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        SwapResult {
            success: false,
            meal: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<ShoppingList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShoppingListResult {
    pub fn success(shopping_list: ShoppingList) -> Self {
        ShoppingListResult {
            success: true,
            shopping_list: Some(shopping_list),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ShoppingListResult {
            success: false,
            shopping_list: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInsightsResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<NutritionInsights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NutritionInsightsResult {
    pub fn success(insights: NutritionInsights) -> Self {
        NutritionInsightsResult {
            success: true,
            insights: Some(insights),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        NutritionInsightsResult {
            success: false,
            insights: None,
            error: Some(error.into()),
        }
    }
}

/// Leading number of a value: `12`, `12.5`, `"450 kcal"`, `"$3.99"`.
/// A range such as `"$150-200"` reads as its lower bound.
fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let digits: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .filter(|c| *c != ',')
                .collect();
            digits.trim_end_matches('.').parse().ok()
        }
        _ => None,
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    value_to_f64(value)
        .filter(|f| *f >= 0.0)
        .and_then(|f| u32::try_from(f.round() as u64).ok())
}

/// Accepts `15`, `15.0` and `"15 minutes"`; anything else becomes 0.
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&value).unwrap_or(0))
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&value))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Amounts and quantities sometimes come back as bare numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Free-text extras. A list of lines is joined; objects are dropped.
fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => {
            let lines: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        other => value_to_text(other),
    })
}

/// A list of strings, or a single string standing in for a one-item list.
fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Optional nested object; a value of the wrong shape reads as absent.
fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn readable_entries<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect()
}

/// List whose unreadable entries are skipped; a non-list reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => readable_entries(items),
        _ => Vec::new(),
    })
}

/// Like [`lenient_list`], but the field itself must be a list.
fn required_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(readable_entries(items)),
        other => Err(de::Error::custom(format!("expected a list, found {}", other))),
    }
}
