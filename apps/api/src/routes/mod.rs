pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::insights::handlers as insights;
use crate::profile::handlers as profile;
use crate::rejections::handlers as rejections;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Add-rejection view
        .route(
            "/api/v1/rejections",
            post(rejections::handle_submit_rejection).get(rejections::handle_list_rejections),
        )
        // Insights and action plan views
        .route("/api/v1/insights", get(insights::handle_get_insights))
        .route("/api/v1/actions", get(insights::handle_get_action_plan))
        // Profile / progress view
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).patch(profile::handle_update_profile),
        )
        .route(
            "/api/v1/profile/gaps/:area/remediation",
            post(profile::handle_start_remediation),
        )
        .with_state(state)
}
