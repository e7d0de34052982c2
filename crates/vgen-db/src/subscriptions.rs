//! Subscription repository.
//!
//! The webhook reconciler writes through two different keys: checkout
//! completion is the only event that knows the user id, so it upserts by
//! `user_id`; every later event carries only the Stripe subscription id
//! and updates by `stripe_subscription_id`. Updates for subscription ids
//! we have no row for affect zero rows and are not errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vgen_models::Subscription;

use crate::error::DbResult;

/// Fields written when a checkout session completes.
#[derive(Debug, Clone)]
pub struct CheckoutUpsert {
    pub user_id: Uuid,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub stripe_price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub quota_limit: i32,
}

/// Data access over subscription (entitlement) rows.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch a user's subscription, if any.
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>>;

    /// Create the free-tier row for a user. Idempotent: an existing row
    /// is left untouched and returned.
    async fn insert_free(&self, user_id: Uuid) -> DbResult<Subscription>;

    /// Overwrite `quota_used` for a user. Returns false when no row
    /// matched.
    async fn set_quota_used(&self, user_id: Uuid, quota_used: i32) -> DbResult<bool>;

    /// Upsert by user id after checkout completion; resets `quota_used`
    /// to zero.
    async fn upsert_checkout(&self, upsert: CheckoutUpsert) -> DbResult<()>;

    /// Update plan fields by subscription id; resets `quota_used` to
    /// zero.
    async fn update_plan_by_subscription(
        &self,
        stripe_subscription_id: &str,
        stripe_price_id: Option<&str>,
        status: &str,
        current_period_end: Option<DateTime<Utc>>,
        quota_limit: i32,
    ) -> DbResult<()>;

    /// Set the status by subscription id; quota fields untouched.
    async fn set_status_by_subscription(
        &self,
        stripe_subscription_id: &str,
        status: &str,
    ) -> DbResult<()>;

    /// Reset `quota_used` to zero by subscription id (monthly refill).
    async fn reset_quota_by_subscription(&self, stripe_subscription_id: &str) -> DbResult<()>;
}

/// Live Postgres implementation.
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>> {
        let sub = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn insert_free(&self, user_id: Uuid) -> DbResult<Subscription> {
        let free = Subscription::free_tier(user_id);

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, user_id, status, quota_limit, quota_used, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(free.id)
        .bind(free.user_id)
        .bind(&free.status)
        .bind(free.quota_limit)
        .bind(free.quota_used)
        .bind(free.created_at)
        .execute(&self.pool)
        .await?;

        // Re-read so a concurrent or pre-existing row wins over our defaults.
        let row = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_quota_used(&self, user_id: Uuid, quota_used: i32) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET quota_used = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(quota_used)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_checkout(&self, upsert: CheckoutUpsert) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, stripe_customer_id, stripe_subscription_id, stripe_price_id,
                status, current_period_end, quota_limit, quota_used, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, now(), now())
            ON CONFLICT (user_id) DO UPDATE SET
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                stripe_price_id = EXCLUDED.stripe_price_id,
                status = EXCLUDED.status,
                current_period_end = EXCLUDED.current_period_end,
                quota_limit = EXCLUDED.quota_limit,
                quota_used = 0,
                updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(upsert.user_id)
        .bind(&upsert.stripe_customer_id)
        .bind(&upsert.stripe_subscription_id)
        .bind(&upsert.stripe_price_id)
        .bind(&upsert.status)
        .bind(upsert.current_period_end)
        .bind(upsert.quota_limit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_plan_by_subscription(
        &self,
        stripe_subscription_id: &str,
        stripe_price_id: Option<&str>,
        status: &str,
        current_period_end: Option<DateTime<Utc>>,
        quota_limit: i32,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                stripe_price_id = $2,
                status = $3,
                current_period_end = $4,
                quota_limit = $5,
                quota_used = 0,
                updated_at = now()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(stripe_price_id)
        .bind(status)
        .bind(current_period_end)
        .bind(quota_limit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_status_by_subscription(
        &self,
        stripe_subscription_id: &str,
        status: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = now() WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_quota_by_subscription(&self, stripe_subscription_id: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET quota_used = 0, updated_at = now() WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
