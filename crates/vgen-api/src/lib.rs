//! Axum HTTP API server.
//!
//! This crate provides:
//! - The image-to-video generation endpoint
//! - Quota gating with lazy free-tier provisioning
//! - Project listing and deletion
//! - Stripe checkout/portal sessions and webhook reconciliation
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
