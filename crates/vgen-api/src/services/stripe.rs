//! Stripe API wrapper.
//!
//! Thin pass-through calls: webhook verification, subscription retrieval
//! for the reconciler, and checkout/portal session creation. Everything
//! the reconciler needs from a subscription is collapsed into
//! [`SubscriptionSnapshot`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client,
    CreateBillingPortalSession, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CustomerId, Subscription, SubscriptionId, Webhook,
};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::error::{ApiError, ApiResult};

/// A verified inbound webhook event, with the payload kept as raw JSON so
/// field extraction stays resilient to provider schema drift.
#[derive(Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// The subscription fields the reconciler acts on.
#[derive(Debug, Clone)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub status: String,
    pub price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Stripe client plus the webhook signing secret.
#[derive(Clone)]
pub struct BillingProvider {
    client: Client,
    webhook_secret: String,
}

impl BillingProvider {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Verify an inbound webhook against the shared signing secret.
    /// Failure means the event is rejected before any processing.
    pub fn verify_webhook(&self, payload: &[u8], signature: &str) -> ApiResult<StripeEvent> {
        let payload_str = std::str::from_utf8(payload)
            .map_err(|e| ApiError::bad_request(format!("Invalid webhook body: {}", e)))?;

        let event = Webhook::construct_event(payload_str, signature, &self.webhook_secret)
            .map_err(|e| ApiError::bad_request(format!("Webhook verification failed: {}", e)))?;

        let payload = serde_json::to_value(&event)
            .map_err(|e| ApiError::billing(format!("Failed to serialize event: {}", e)))?;

        Ok(StripeEvent {
            id: event.id.to_string(),
            event_type: event.type_.to_string(),
            payload,
        })
    }

    /// Fetch a subscription and collapse it to the fields we store.
    pub async fn retrieve_subscription(&self, id: &str) -> ApiResult<SubscriptionSnapshot> {
        let sub_id: SubscriptionId = id
            .parse()
            .map_err(|_| ApiError::billing(format!("Invalid subscription id: {}", id)))?;

        let sub = Subscription::retrieve(&self.client, &sub_id, &[])
            .await
            .map_err(|e| ApiError::billing(format!("Failed to retrieve subscription: {}", e)))?;

        let price_id = sub
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.to_string());

        Ok(SubscriptionSnapshot {
            id: sub.id.to_string(),
            status: sub.status.to_string(),
            price_id,
            current_period_end: DateTime::<Utc>::from_timestamp(sub.current_period_end, 0),
        })
    }

    /// Create a subscription checkout session. The user id travels in the
    /// session metadata; it is the only place the webhook can learn which
    /// user completed checkout.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        user_id: Uuid,
        customer_email: Option<&str>,
        success_url: &str,
        cancel_url: &str,
    ) -> ApiResult<String> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.customer_email = customer_email;
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]);

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user_id.to_string());
        params.metadata = Some(metadata);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| ApiError::billing(format!("Failed to create checkout session: {}", e)))?;

        session
            .url
            .ok_or_else(|| ApiError::billing("Checkout session has no URL"))
    }

    /// Create a billing-portal session for an existing customer.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> ApiResult<String> {
        let customer: CustomerId = customer_id
            .parse()
            .map_err(|_| ApiError::billing(format!("Invalid customer id: {}", customer_id)))?;

        let mut params = CreateBillingPortalSession::new(customer);
        params.return_url = Some(return_url);

        let session = BillingPortalSession::create(&self.client, params)
            .await
            .map_err(|e| ApiError::billing(format!("Failed to create portal session: {}", e)))?;

        Ok(session.url)
    }
}
