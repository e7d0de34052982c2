//! Application state.

use std::sync::Arc;

use vgen_db::{PgProjectStore, PgSubscriptionStore};
use vgen_sora::SoraClient;
use vgen_storage::R2ObjectStore;

use crate::config::ApiConfig;
use crate::services::stripe::BillingProvider;
use crate::services::{BillingService, EntitlementService, GenerationService, ProjectService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub billing_provider: BillingProvider,
    pub entitlement_service: EntitlementService,
    pub generation_service: GenerationService,
    pub project_service: ProjectService,
    pub billing_service: BillingService,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let pool = vgen_db::connect_from_env().await?;
        let subscriptions = Arc::new(PgSubscriptionStore::new(pool.clone()));
        let projects = Arc::new(PgProjectStore::new(pool));
        let storage = Arc::new(R2ObjectStore::from_env()?);
        let sora = SoraClient::from_env()?;

        let billing_provider = BillingProvider::new(&config.billing);
        let entitlement_service =
            EntitlementService::new(subscriptions.clone(), config.upgrade_url());
        let generation_service = GenerationService::new(
            entitlement_service.clone(),
            projects.clone(),
            storage.clone(),
            sora,
        );
        let project_service = ProjectService::new(projects, storage);
        let billing_service = BillingService::new(subscriptions, config.billing.clone());

        Ok(Self {
            config,
            billing_provider,
            entitlement_service,
            generation_service,
            project_service,
            billing_service,
        })
    }
}
