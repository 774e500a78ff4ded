//! Preference normalisation.
//!
//! Preferences arrive from a first-party UI as loosely-typed JSON. Nothing
//! here ever fails: missing, null or wrongly-typed fields fall back to their
//! defaults, and tier limits are applied before any prompt is built.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_COOKING_TIME_LIMIT: u32 = 30;
pub const DEFAULT_FAMILY_SIZE: u32 = 2;

/// Fully-populated preferences, already limited to what the tier allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub calorie_target: Option<u32>,
    pub cooking_time_limit: u32,
    pub cuisine_types: Vec<String>,
    pub family_size: u32,
    pub kid_friendly: bool,
    pub budget: Option<f64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            calorie_target: None,
            cooking_time_limit: DEFAULT_COOKING_TIME_LIMIT,
            cuisine_types: Vec::new(),
            family_size: DEFAULT_FAMILY_SIZE,
            kid_friendly: false,
            budget: None,
        }
    }
}

impl Preferences {
    /// Build normalised preferences from raw JSON for the given tier.
    ///
    /// Dietary restrictions keep the first N entries in input order, where N
    /// is the tier's cap. Cuisine types are dropped for tiers that do not get
    /// a cuisine line and the kid-friendly flag only survives for premium
    /// tiers. Allergies are never truncated.
    pub fn normalize(raw: &Value, tier: Tier) -> Self {
        let empty = Map::new();
        let fields = raw.as_object().unwrap_or(&empty);
        let profile = tier.profile();

        let mut dietary_restrictions = string_list(fields.get("dietaryRestrictions"));
        dietary_restrictions.truncate(profile.dietary_restriction_cap);

        let cuisine_types = if profile.cuisine_preferences {
            string_list(fields.get("cuisineTypes"))
        } else {
            Vec::new()
        };

        let kid_friendly = profile.premium_guidance && truthy(fields.get("kidFriendly"));

        Preferences {
            dietary_restrictions,
            allergies: string_list(fields.get("allergies")),
            calorie_target: positive_u32(fields.get("calorieTarget")),
            cooking_time_limit: positive_u32(fields.get("cookingTimeLimit"))
                .unwrap_or(DEFAULT_COOKING_TIME_LIMIT),
            cuisine_types,
            family_size: positive_u32(fields.get("familySize")).unwrap_or(DEFAULT_FAMILY_SIZE),
            kid_friendly,
            budget: positive_f64(fields.get("budget")),
        }
    }

    /// Normalise an already-typed record again, e.g. after a tier change.
    pub fn for_tier(&self, tier: Tier) -> Self {
        match serde_json::to_value(self) {
            Ok(raw) => Preferences::normalize(&raw, tier),
            Err(_) => Preferences::default(),
        }
    }
}

/// Lists may come as arrays or as one comma-separated string.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

// Zero means "not set", the same as absent.
fn positive_u32(value: Option<&Value>) -> Option<u32> {
    number(value)
        .filter(|n| *n >= 1.0)
        .map(|n| n.round().min(u32::MAX as f64) as u32)
}

fn positive_f64(value: Option<&Value>) -> Option<f64> {
    number(value).filter(|n| *n > 0.0)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => false,
    }
}
