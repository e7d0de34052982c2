//! Quota gate over subscription records.
//!
//! Gating is a two-step read-then-write with no transactional isolation:
//! two simultaneous requests from one user can both pass the check before
//! either writes, transiently overshooting the limit by at most the
//! number of concurrent callers minus one. This fail-open policy is
//! deliberate; do not replace it with a transactional guard.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use vgen_db::SubscriptionStore;
use vgen_models::Subscription;

use crate::error::{ApiError, ApiResult};

/// Service gating access to generations and tracking consumption.
#[derive(Clone)]
pub struct EntitlementService {
    subscriptions: Arc<dyn SubscriptionStore>,
    upgrade_url: String,
}

impl EntitlementService {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, upgrade_url: String) -> Self {
        Self {
            subscriptions,
            upgrade_url,
        }
    }

    /// Current entitlement, for display. Does not provision.
    pub async fn get(&self, user_id: Uuid) -> ApiResult<Option<Subscription>> {
        Ok(self.subscriptions.find_by_user(user_id).await?)
    }

    /// Authorize a new generation, lazily provisioning the free tier for
    /// users seen for the first time. Refusal carries the upgrade hint.
    pub async fn ensure_can_generate(&self, user_id: Uuid) -> ApiResult<()> {
        let subscription = match self.subscriptions.find_by_user(user_id).await? {
            Some(sub) => sub,
            None => {
                info!(user_id = %user_id, "No subscription found, provisioning free tier");
                self.subscriptions.insert_free(user_id).await?
            }
        };

        if subscription.can_generate() {
            Ok(())
        } else {
            warn!(
                user_id = %user_id,
                quota_used = subscription.quota_used,
                quota_limit = subscription.quota_limit,
                status = subscription.status.as_deref().unwrap_or("<null>"),
                "Generation refused by quota gate"
            );
            Err(ApiError::QuotaExhausted {
                upgrade_url: self.upgrade_url.clone(),
            })
        }
    }

    /// Advance the usage counter by one. Returns false without mutating
    /// when the record is missing or the quota is already exhausted.
    pub async fn increment_usage(&self, user_id: Uuid) -> ApiResult<bool> {
        let subscription = match self.subscriptions.find_by_user(user_id).await? {
            Some(sub) => sub,
            None => return Ok(false),
        };

        if !subscription.has_quota_remaining() {
            return Ok(false);
        }

        let updated = self
            .subscriptions
            .set_quota_used(user_id, subscription.quota_used + 1)
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_store::MemorySubscriptionStore;
    use vgen_models::FREE_MONTHLY_QUOTA;

    fn service(store: Arc<MemorySubscriptionStore>) -> EntitlementService {
        EntitlementService::new(store, "https://app.example/pricing".to_string())
    }

    #[tokio::test]
    async fn first_gate_check_provisions_free_tier_once() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());
        let user = Uuid::new_v4();

        svc.ensure_can_generate(user).await.unwrap();
        svc.ensure_can_generate(user).await.unwrap();

        let sub = store.get(user).unwrap();
        assert_eq!(store.row_count(), 1);
        assert_eq!(sub.quota_limit, FREE_MONTHLY_QUOTA);
        assert_eq!(sub.quota_used, 0);
        assert_eq!(sub.status.as_deref(), Some("active"));
    }

    #[tokio::test]
    async fn sequential_increments_never_exceed_limit() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());
        let user = Uuid::new_v4();
        store.seed(user, 0, 3, Some("active"));

        let mut results = Vec::new();
        for _ in 0..5 {
            results.push(svc.increment_usage(user).await.unwrap());
        }

        assert_eq!(results, vec![true, true, true, false, false]);
        assert_eq!(store.get(user).unwrap().quota_used, 3);
    }

    #[tokio::test]
    async fn increment_without_record_refuses_without_creating() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());

        assert!(!svc.increment_usage(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_quota_is_refused_with_upgrade_hint() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());
        let user = Uuid::new_v4();
        store.seed(user, 50, 50, Some("active"));

        let err = svc.ensure_can_generate(user).await.unwrap_err();
        match err {
            ApiError::QuotaExhausted { upgrade_url } => {
                assert_eq!(upgrade_url, "https://app.example/pricing");
            }
            other => panic!("expected quota exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn blocking_status_is_refused() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());
        let user = Uuid::new_v4();
        store.seed(user, 0, 50, Some("past_due"));

        assert!(svc.ensure_can_generate(user).await.is_err());
    }

    #[tokio::test]
    async fn last_unit_of_quota_then_refusal() {
        let store = Arc::new(MemorySubscriptionStore::default());
        let svc = service(store.clone());
        let user = Uuid::new_v4();
        store.seed(user, 49, 50, Some("active"));

        svc.ensure_can_generate(user).await.unwrap();
        assert!(svc.increment_usage(user).await.unwrap());
        assert_eq!(store.get(user).unwrap().quota_used, 50);
        assert!(svc.ensure_can_generate(user).await.is_err());
    }
}
