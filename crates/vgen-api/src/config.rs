//! API configuration.

use vgen_models::{PlanTier, DEFAULT_MONTHLY_QUOTA};

/// Stripe configuration: credentials plus the price-id to quota mapping.
#[derive(Debug, Clone, Default)]
pub struct BillingConfig {
    /// Secret API key.
    pub secret_key: String,
    /// Webhook signing secret shared with Stripe.
    pub webhook_secret: String,
    /// Price id of the basic plan.
    pub price_basic: String,
    /// Price id of the pro plan.
    pub price_pro: String,
}

impl BillingConfig {
    /// Monthly quota for a Stripe price id. Unrecognized ids get the
    /// default limit.
    pub fn quota_limit_for_price(&self, price_id: &str) -> i32 {
        if !self.price_basic.is_empty() && price_id == self.price_basic {
            PlanTier::Free.monthly_quota()
        } else if !self.price_pro.is_empty() && price_id == self.price_pro {
            PlanTier::Pro.monthly_quota()
        } else {
            DEFAULT_MONTHLY_QUOTA
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (uploads are images, not videos)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for verifying bearer tokens
    pub jwt_secret: String,
    /// Public base URL of the frontend, used for checkout redirects and
    /// the upgrade hint on quota-exhausted responses
    pub app_base_url: String,
    /// Stripe settings
    pub billing: BillingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            jwt_secret: String::new(),
            app_base_url: "http://localhost:3000".to_string(),
            billing: BillingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            app_base_url: std::env::var("APP_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.app_base_url),
            billing: BillingConfig {
                secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                price_basic: std::env::var("STRIPE_PRICE_BASIC").unwrap_or_default(),
                price_pro: std::env::var("STRIPE_PRICE_PRO").unwrap_or_default(),
            },
        }
    }

    /// URL of the pricing page, surfaced when quota runs out.
    pub fn upgrade_url(&self) -> String {
        format!("{}/pricing", self.app_base_url)
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing() -> BillingConfig {
        BillingConfig {
            price_basic: "price_basic_123".to_string(),
            price_pro: "price_pro_456".to_string(),
            ..BillingConfig::default()
        }
    }

    #[test]
    fn price_mapping_hits_both_tiers() {
        let b = billing();
        assert_eq!(b.quota_limit_for_price("price_basic_123"), 50);
        assert_eq!(b.quota_limit_for_price("price_pro_456"), 200);
    }

    #[test]
    fn unknown_price_gets_default_limit() {
        assert_eq!(billing().quota_limit_for_price("price_other"), 50);
    }

    #[test]
    fn empty_config_never_matches_empty_price() {
        // Unset env vars must not make "" map to a paid tier.
        let b = BillingConfig::default();
        assert_eq!(b.quota_limit_for_price(""), DEFAULT_MONTHLY_QUOTA);
    }
}
