//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::billing::{create_checkout, create_portal, webhook};
use crate::handlers::entitlement::get_entitlement;
use crate::handlers::generate::generate;
use crate::handlers::health::health;
use crate::handlers::projects::{delete_project, list_projects};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/generate", post(generate))
        .route("/projects", get(list_projects))
        .route("/projects/:project_id", delete(delete_project))
        .route("/entitlement", get(get_entitlement))
        .route("/billing/checkout", post(create_checkout))
        .route("/billing/portal", post(create_portal))
        // Authenticated by signature verification, not a bearer token.
        .route("/billing/webhook", post(webhook));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Uploads are images, not videos; keep request bodies bounded.
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
