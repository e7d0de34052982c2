//! Entitlement view endpoint.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use vgen_models::{Subscription, FREE_MONTHLY_QUOTA};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// What the frontend renders on the account page.
#[derive(Serialize)]
pub struct EntitlementResponse {
    pub status: String,
    pub quota_limit: i32,
    pub quota_used: i32,
    pub quota_remaining: i32,
    pub can_generate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
    pub has_billing_account: bool,
}

impl EntitlementResponse {
    fn from_subscription(sub: &Subscription) -> Self {
        Self {
            status: sub.status.clone().unwrap_or_else(|| "active".to_string()),
            quota_limit: sub.quota_limit,
            quota_used: sub.quota_used,
            quota_remaining: sub.quota_remaining(),
            can_generate: sub.can_generate(),
            current_period_end: sub.current_period_end,
            has_billing_account: sub.stripe_customer_id.is_some(),
        }
    }

    /// View for a user with no row yet. The free tier is provisioned
    /// lazily on first generation, so reading must not create anything.
    fn implicit_free() -> Self {
        Self {
            status: "active".to_string(),
            quota_limit: FREE_MONTHLY_QUOTA,
            quota_used: 0,
            quota_remaining: FREE_MONTHLY_QUOTA,
            can_generate: true,
            current_period_end: None,
            has_billing_account: false,
        }
    }
}

/// GET /api/entitlement
pub async fn get_entitlement(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<EntitlementResponse>> {
    let response = match state.entitlement_service.get(user.id).await? {
        Some(sub) => EntitlementResponse::from_subscription(&sub),
        None => EntitlementResponse::implicit_free(),
    };
    Ok(Json(response))
}
