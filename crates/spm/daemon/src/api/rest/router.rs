//! API router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        .route("/diagnostics", get(handlers::binding_diagnostics))
        // Documents
        .route(
            "/tenants/:tenant_id/documents/import",
            post(handlers::import_document),
        )
        .route(
            "/tenants/:tenant_id/documents/upload",
            post(handlers::upload_document),
        )
        .route(
            "/tenants/:tenant_id/documents/:document_id/versions",
            get(handlers::list_versions),
        )
        .route(
            "/tenants/:tenant_id/documents/:document_id/active",
            get(handlers::get_active_version),
        )
        .route(
            "/tenants/:tenant_id/documents/:document_id/timeline",
            get(handlers::get_timeline),
        )
        .route(
            "/tenants/:tenant_id/documents/:document_id/stats",
            get(handlers::get_stats),
        )
        .route(
            "/tenants/:tenant_id/documents/:document_id/next-version",
            get(handlers::next_version_number),
        )
        // Versions
        .route(
            "/tenants/:tenant_id/versions/:version_id",
            get(handlers::get_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/process",
            post(handlers::process_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/draft",
            post(handlers::draft_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/submit",
            post(handlers::submit_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/approve",
            post(handlers::approve_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/reject",
            post(handlers::reject_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/publish",
            post(handlers::publish_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/archive",
            post(handlers::archive_version),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/can-transition",
            get(handlers::can_transition),
        )
        .route(
            "/tenants/:tenant_id/versions/:version_id/compare/:other_id",
            get(handlers::compare_versions),
        )
        .route("/tenants/:tenant_id/checksum", post(handlers::checksum))
        // Governance
        .route("/tenants/:tenant_id/policies", get(handlers::list_policies))
        .route(
            "/tenants/:tenant_id/policies/:policy_id",
            get(handlers::get_policy),
        )
        .route(
            "/tenants/:tenant_id/committees",
            get(handlers::list_committees),
        )
        .route(
            "/tenants/:tenant_id/committees/:committee_id",
            get(handlers::get_committee),
        )
        .route("/tenants/:tenant_id/audit", get(handlers::list_audit))
        .route("/tenants/:tenant_id/audit/head", get(handlers::audit_head))
        .route("/tenants/:tenant_id/search", get(handlers::search));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}
