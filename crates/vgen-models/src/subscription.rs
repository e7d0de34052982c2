//! Subscription (entitlement) records.
//!
//! One live row per user. Created lazily with free-tier defaults on the
//! first generation attempt, mutated by the quota gate (usage increments)
//! and by the Stripe webhook reconciler (plan, limit, status, resets).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::plan::FREE_MONTHLY_QUOTA;

/// The only status value that allows new generations. A NULL status is
/// treated as active for gating purposes (rows written before the status
/// column existed carry NULL).
pub const SUBSCRIPTION_STATUS_ACTIVE: &str = "active";

/// A user's entitlement: plan, quota ceiling, and consumption counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    /// `active`, `past_due`, `canceled`, or NULL (gates as active).
    pub status: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub quota_limit: i32,
    pub quota_used: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Free-tier row written on first contact with a user.
    pub fn free_tier(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            stripe_price_id: None,
            status: Some(SUBSCRIPTION_STATUS_ACTIVE.to_string()),
            current_period_end: None,
            quota_limit: FREE_MONTHLY_QUOTA,
            quota_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the subscription status permits new generations.
    /// NULL gates as active; anything else (`past_due`, `canceled`, ...)
    /// blocks.
    pub fn status_allows_generation(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(s) => s == SUBSCRIPTION_STATUS_ACTIVE,
        }
    }

    /// Whether there is quota left in the current period.
    pub fn has_quota_remaining(&self) -> bool {
        self.quota_used < self.quota_limit
    }

    /// The quota-gate predicate: status must allow generation and quota
    /// must not be exhausted.
    pub fn can_generate(&self) -> bool {
        self.status_allows_generation() && self.has_quota_remaining()
    }

    /// Generations remaining in the current period.
    pub fn quota_remaining(&self) -> i32 {
        (self.quota_limit - self.quota_used).max(0)
    }
}
