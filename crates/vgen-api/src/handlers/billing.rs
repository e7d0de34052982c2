//! Billing endpoints: checkout, portal, and the Stripe webhook.
//!
//! The webhook works on the raw event JSON. Stripe's payload shapes vary
//! by API version and expansion settings (ids arrive as plain strings or
//! as expanded objects), so field extraction goes through small lookup
//! helpers instead of typed deserialization.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::stripe::SubscriptionSnapshot;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    /// "basic" or "pro".
    pub plan: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub url: String,
}

/// POST /api/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let price_id = match request.plan.as_str() {
        "basic" => &state.config.billing.price_basic,
        "pro" => &state.config.billing.price_pro,
        other => return Err(ApiError::bad_request(format!("Unknown plan: {}", other))),
    };
    if price_id.is_empty() {
        return Err(ApiError::billing("Plan is not configured"));
    }

    let success_url = format!("{}/dashboard?checkout=success", state.config.app_base_url);
    let cancel_url = format!("{}/pricing", state.config.app_base_url);

    let url = state
        .billing_provider
        .create_checkout_session(
            price_id,
            user.id,
            user.email.as_deref(),
            &success_url,
            &cancel_url,
        )
        .await?;

    info!(user_id = %user.id, plan = %request.plan, "Checkout session created");
    Ok(Json(SessionResponse { url }))
}

/// POST /api/billing/portal
pub async fn create_portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SessionResponse>> {
    let customer_id = state
        .entitlement_service
        .get(user.id)
        .await?
        .and_then(|sub| sub.stripe_customer_id)
        .ok_or_else(|| ApiError::bad_request("No billing account for this user"))?;

    let return_url = format!("{}/dashboard", state.config.app_base_url);
    let url = state
        .billing_provider
        .create_portal_session(&customer_id, &return_url)
        .await?;

    Ok(Json(SessionResponse { url }))
}

// Small helper: nested json lookup
fn jget<'a>(val: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = val;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

fn extract_str<'a>(val: &'a Value, path: &[&str]) -> Option<&'a str> {
    jget(val, path)?.as_str()
}

/// An id field that may arrive as a plain string or as an expanded object
/// with an `id`.
fn extract_id(val: &Value, path: &[&str]) -> Option<String> {
    let field = jget(val, path)?;
    match field {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => field.get("id").and_then(|v| v.as_str()).map(String::from),
        _ => None,
    }
}

fn extract_checkout_user_id(event: &Value) -> Option<Uuid> {
    let uid = extract_str(event, &["data", "object", "metadata", "user_id"])
        .or_else(|| extract_str(event, &["data", "object", "client_reference_id"]))?;
    Uuid::parse_str(uid).ok()
}

fn extract_period_end(object: &Value) -> Option<DateTime<Utc>> {
    object
        .get("current_period_end")
        .and_then(|v| v.as_i64())
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
}

/// Build a snapshot from an event whose `data.object` is a subscription.
fn snapshot_from_subscription_object(event: &Value) -> Option<SubscriptionSnapshot> {
    let object = jget(event, &["data", "object"])?;
    let id = object.get("id")?.as_str()?.to_string();
    let status = object
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("active")
        .to_string();
    let price_id = object
        .pointer("/items/data/0/price/id")
        .and_then(|v| v.as_str())
        .map(String::from);
    Some(SubscriptionSnapshot {
        id,
        status,
        price_id,
        current_period_end: extract_period_end(object),
    })
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

fn ack() -> Json<WebhookAck> {
    Json(WebhookAck { received: true })
}

/// POST /api/billing/webhook
///
/// Signature failures answer 400. Most malformed-but-verified events are
/// acknowledged with a warning: Stripe retrying them will not make the
/// fields appear. The exception is a checkout completion without the
/// user id in its metadata — that is a paid checkout we cannot credit,
/// so it answers non-2xx and Stripe keeps retrying. Database failures
/// answer 500 for the same reason.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Stripe-Signature"))?;

    let event = state.billing_provider.verify_webhook(&body, signature)?;
    let payload = &event.payload;
    info!(event_id = %event.id, event_type = %event.event_type, "Webhook event received");

    let outcome = match event.event_type.as_str() {
        "checkout.session.completed" => {
            handle_checkout_completed(&state, payload).await?
        }
        "customer.subscription.updated" => match snapshot_from_subscription_object(payload) {
            Some(snapshot) => {
                state
                    .billing_service
                    .apply_subscription_updated(&snapshot)
                    .await?;
                "applied"
            }
            None => {
                warn!(event_id = %event.id, "subscription.updated without a usable object");
                "malformed"
            }
        },
        "customer.subscription.deleted" => {
            match extract_str(payload, &["data", "object", "id"]) {
                Some(subscription_id) => {
                    state
                        .billing_service
                        .apply_subscription_deleted(subscription_id)
                        .await?;
                    "applied"
                }
                None => {
                    warn!(event_id = %event.id, "subscription.deleted without an id");
                    "malformed"
                }
            }
        }
        "invoice.payment_succeeded" => {
            match extract_id(payload, &["data", "object", "subscription"]) {
                Some(subscription_id) => {
                    state
                        .billing_service
                        .apply_invoice_payment_succeeded(&subscription_id)
                        .await?;
                    "applied"
                }
                None => "ignored", // one-off invoices carry no subscription
            }
        }
        "invoice.payment_failed" => {
            match extract_id(payload, &["data", "object", "subscription"]) {
                Some(subscription_id) => {
                    state
                        .billing_service
                        .apply_invoice_payment_failed(&subscription_id)
                        .await?;
                    "applied"
                }
                None => "ignored",
            }
        }
        _ => "ignored",
    };

    metrics::record_webhook_event(&event.event_type, outcome);
    Ok(ack())
}

async fn handle_checkout_completed(
    state: &AppState,
    payload: &Value,
) -> ApiResult<&'static str> {
    // A completed checkout we cannot attribute is money taken without
    // quota granted. Fail the delivery so Stripe retries it.
    let user_id = extract_checkout_user_id(payload).ok_or_else(|| {
        ApiError::bad_request("Checkout session missing user_id metadata")
    })?;
    let customer_id = match extract_id(payload, &["data", "object", "customer"]) {
        Some(id) => id,
        None => {
            warn!("checkout.session.completed without a customer");
            return Ok("malformed");
        }
    };
    let subscription_id = match extract_id(payload, &["data", "object", "subscription"]) {
        Some(id) => id,
        None => {
            warn!("checkout.session.completed without a subscription");
            return Ok("malformed");
        }
    };

    // The session payload does not carry price or period; fetch the
    // subscription for the authoritative plan fields.
    let snapshot = state
        .billing_provider
        .retrieve_subscription(&subscription_id)
        .await?;

    state
        .billing_service
        .apply_checkout_completed(user_id, &customer_id, &snapshot)
        .await?;
    Ok("applied")
}
