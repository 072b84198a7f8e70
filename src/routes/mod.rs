pub mod admin;
pub mod agents;
pub mod auth;
pub mod customers;
pub mod health;
pub mod search;
pub mod warehouses;

use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/warehouse/search", get(search::search_warehouses))
        .route("/warehouse/bounds", get(search::warehouses_in_bounds))
        .route("/agent/domain/check", get(agents::check_domain))
        // Sign-in and sessions
        .route("/auth/session", get(auth::get_session))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/:provider", get(auth::oauth_start))
        .route("/auth/:provider/callback", get(auth::oauth_callback))
        // Registration
        .route("/customer/register", post(customers::register_customer))
        .route("/agent/register", post(agents::register_agent))
        .route("/agent/domain", post(agents::claim_domain))
        .route("/agent/banner", post(agents::upload_banner))
        // Listings
        .route("/warehouse", post(warehouses::create_warehouse))
        .route("/warehouse/my", get(warehouses::my_warehouses))
        .route("/warehouse/:id", get(warehouses::get_warehouse))
        .route("/warehouse/:id", put(warehouses::update_warehouse))
        // Admin
        .route("/admin/warehouses", get(admin::list_warehouses))
        .route(
            "/admin/warehouses/:id/approve",
            post(admin::approve_warehouse),
        )
        .route(
            "/admin/warehouses/:id/reject",
            post(admin::reject_warehouse),
        )
        .route("/admin/customers", get(admin::list_customers))
        .route("/admin/agents", get(admin::list_agents))
        .route("/admin/agents/:id/verify", post(admin::verify_agent))
        .route("/admin/users/:id", delete(admin::delete_user))
}
