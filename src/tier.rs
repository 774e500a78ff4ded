use crate::error::MealPlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription level controlling how rich a generated plan is.
///
/// Variants are declared in ascending order so the derived `Ord` matches the
/// product ordering `free < basic < premium < premiumPlus`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Premium,
    PremiumPlus,
}

/// Which size of model a request should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelClass {
    /// Cheaper, faster model variant
    Fast,
    /// Larger, high-capability model variant
    Pro,
}

/// Everything that varies by tier, in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierProfile {
    pub dietary_restriction_cap: usize,
    pub days: usize,
    pub meals_per_day: usize,
    pub cuisine_preferences: bool,
    pub nutrition: bool,
    /// Kid-friendly, budget and calorie lines plus the premium tip fields
    pub premium_guidance: bool,
    pub model_class: ModelClass,
    pub max_output_tokens: u32,
    pub truncate_to_single_day: bool,
}

const FREE: TierProfile = TierProfile {
    dietary_restriction_cap: 1,
    days: 1,
    meals_per_day: 3,
    cuisine_preferences: false,
    nutrition: false,
    premium_guidance: false,
    model_class: ModelClass::Fast,
    max_output_tokens: 4096,
    truncate_to_single_day: true,
};

const BASIC: TierProfile = TierProfile {
    dietary_restriction_cap: 3,
    days: 7,
    meals_per_day: 3,
    cuisine_preferences: true,
    nutrition: true,
    premium_guidance: false,
    model_class: ModelClass::Fast,
    max_output_tokens: 4096,
    truncate_to_single_day: false,
};

const PREMIUM: TierProfile = TierProfile {
    dietary_restriction_cap: 5,
    days: 7,
    meals_per_day: 3,
    cuisine_preferences: true,
    nutrition: true,
    premium_guidance: true,
    model_class: ModelClass::Pro,
    max_output_tokens: 8192,
    truncate_to_single_day: false,
};

const PREMIUM_PLUS: TierProfile = TierProfile {
    dietary_restriction_cap: 999,
    ..PREMIUM
};

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Basic, Tier::Premium, Tier::PremiumPlus];

    pub fn profile(self) -> &'static TierProfile {
        match self {
            Tier::Free => &FREE,
            Tier::Basic => &BASIC,
            Tier::Premium => &PREMIUM,
            Tier::PremiumPlus => &PREMIUM_PLUS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Premium => "premium",
            Tier::PremiumPlus => "premiumPlus",
        }
    }

    pub fn model_class(self) -> ModelClass {
        self.profile().model_class
    }

    pub fn is_premium(self) -> bool {
        self >= Tier::Premium
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = MealPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the wire spelling as well as kebab/snake variants typed on a CLI
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "free" => Ok(Tier::Free),
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            "premiumplus" => Ok(Tier::PremiumPlus),
            _ => Err(MealPlanError::InvalidTier(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Free < Tier::Basic);
        assert!(Tier::Basic < Tier::Premium);
        assert!(Tier::Premium < Tier::PremiumPlus);
    }

    #[test]
    fn test_dietary_caps() {
        assert_eq!(Tier::Free.profile().dietary_restriction_cap, 1);
        assert_eq!(Tier::Basic.profile().dietary_restriction_cap, 3);
        assert_eq!(Tier::Premium.profile().dietary_restriction_cap, 5);
        assert_eq!(Tier::PremiumPlus.profile().dietary_restriction_cap, 999);
    }

    #[test]
    fn test_model_class_selection() {
        assert_eq!(Tier::Free.model_class(), ModelClass::Fast);
        assert_eq!(Tier::Basic.model_class(), ModelClass::Fast);
        assert_eq!(Tier::Premium.model_class(), ModelClass::Pro);
        assert_eq!(Tier::PremiumPlus.model_class(), ModelClass::Pro);
    }

    #[test]
    fn test_only_free_truncates() {
        for tier in Tier::ALL {
            assert_eq!(
                tier.profile().truncate_to_single_day,
                tier == Tier::Free,
                "unexpected truncation flag for {}",
                tier
            );
        }
    }

    #[test]
    fn test_profiles_are_monotonic() {
        for pair in Tier::ALL.windows(2) {
            let (lower, higher) = (pair[0].profile(), pair[1].profile());
            assert!(higher.dietary_restriction_cap >= lower.dietary_restriction_cap);
            assert!(higher.days >= lower.days);
            assert!(higher.nutrition || !lower.nutrition);
            assert!(higher.cuisine_preferences || !lower.cuisine_preferences);
            assert!(higher.premium_guidance || !lower.premium_guidance);
        }
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!("free".parse::<Tier>().unwrap(), Tier::Free);
        assert_eq!("premiumPlus".parse::<Tier>().unwrap(), Tier::PremiumPlus);
        assert_eq!("premium-plus".parse::<Tier>().unwrap(), Tier::PremiumPlus);
        assert_eq!(" Basic ".parse::<Tier>().unwrap(), Tier::Basic);
        assert!("annual".parse::<Tier>().is_err());
    }

    #[test]
    fn test_serde_spelling() {
        assert_eq!(
            serde_json::to_string(&Tier::PremiumPlus).unwrap(),
            "\"premiumPlus\""
        );
        let tier: Tier = serde_json::from_str("\"basic\"").unwrap();
        assert_eq!(tier, Tier::Basic);
    }
}
