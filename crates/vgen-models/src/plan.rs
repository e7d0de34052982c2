//! Plan tiers and monthly generation quotas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generations per month for each plan tier.
pub const FREE_MONTHLY_QUOTA: i32 = 50;
pub const PRO_MONTHLY_QUOTA: i32 = 200;

/// Quota applied when a Stripe price id is not recognized.
pub const DEFAULT_MONTHLY_QUOTA: i32 = 50;

/// Plan tier enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

impl PlanTier {
    /// Get the monthly generation quota for this plan.
    pub fn monthly_quota(&self) -> i32 {
        match self {
            PlanTier::Free => FREE_MONTHLY_QUOTA,
            PlanTier::Pro => PRO_MONTHLY_QUOTA,
        }
    }

    /// Get the plan name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
