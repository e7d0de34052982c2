//! Webhook reconciliation into entitlement state.
//!
//! Checkout completion is the only event that carries the user id (via
//! session metadata), so it writes keyed by user. Every later lifecycle
//! event carries only the Stripe subscription id and writes keyed by
//! that. Events for subscriptions we never recorded update zero rows,
//! which is correct: the webhook may deliver events for other
//! deployments sharing the Stripe account.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use vgen_db::{CheckoutUpsert, SubscriptionStore};
use vgen_models::DEFAULT_MONTHLY_QUOTA;

use crate::config::BillingConfig;
use crate::error::ApiResult;
use crate::services::stripe::SubscriptionSnapshot;

#[derive(Clone)]
pub struct BillingService {
    subscriptions: Arc<dyn SubscriptionStore>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, config: BillingConfig) -> Self {
        Self {
            subscriptions,
            config,
        }
    }

    fn quota_limit(&self, price_id: Option<&str>) -> i32 {
        price_id
            .map(|p| self.config.quota_limit_for_price(p))
            .unwrap_or(DEFAULT_MONTHLY_QUOTA)
    }

    /// `checkout.session.completed`: bind the Stripe identifiers to the
    /// user and start the paid plan with a fresh quota.
    pub async fn apply_checkout_completed(
        &self,
        user_id: Uuid,
        customer_id: &str,
        snapshot: &SubscriptionSnapshot,
    ) -> ApiResult<()> {
        let quota_limit = self.quota_limit(snapshot.price_id.as_deref());
        self.subscriptions
            .upsert_checkout(CheckoutUpsert {
                user_id,
                stripe_customer_id: customer_id.to_string(),
                stripe_subscription_id: snapshot.id.clone(),
                stripe_price_id: snapshot.price_id.clone(),
                status: snapshot.status.clone(),
                current_period_end: snapshot.current_period_end,
                quota_limit,
            })
            .await?;

        info!(
            user_id = %user_id,
            subscription = %snapshot.id,
            quota_limit,
            "Checkout completed, plan activated"
        );
        Ok(())
    }

    /// `customer.subscription.updated`: refresh plan, status, and period;
    /// plan changes start a fresh quota.
    pub async fn apply_subscription_updated(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> ApiResult<()> {
        let quota_limit = self.quota_limit(snapshot.price_id.as_deref());
        self.subscriptions
            .update_plan_by_subscription(
                &snapshot.id,
                snapshot.price_id.as_deref(),
                &snapshot.status,
                snapshot.current_period_end,
                quota_limit,
            )
            .await?;

        info!(subscription = %snapshot.id, status = %snapshot.status, "Subscription updated");
        Ok(())
    }

    /// `customer.subscription.deleted`: mark canceled. Quota fields stay
    /// as they are; the status alone blocks generation.
    pub async fn apply_subscription_deleted(&self, subscription_id: &str) -> ApiResult<()> {
        self.subscriptions
            .set_status_by_subscription(subscription_id, "canceled")
            .await?;

        info!(subscription = %subscription_id, "Subscription canceled");
        Ok(())
    }

    /// `invoice.payment_succeeded`: monthly renewal refills the quota.
    pub async fn apply_invoice_payment_succeeded(&self, subscription_id: &str) -> ApiResult<()> {
        self.subscriptions
            .reset_quota_by_subscription(subscription_id)
            .await?;

        info!(subscription = %subscription_id, "Invoice paid, quota reset");
        Ok(())
    }

    /// `invoice.payment_failed`: block generation until payment recovers.
    pub async fn apply_invoice_payment_failed(&self, subscription_id: &str) -> ApiResult<()> {
        self.subscriptions
            .set_status_by_subscription(subscription_id, "past_due")
            .await?;

        info!(subscription = %subscription_id, "Invoice payment failed, plan past due");
        Ok(())
    }
}
