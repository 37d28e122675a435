use axum::{extract::State, Json};

use crate::insights::models::{ActionItem, InsightSnapshot};
use crate::state::AppState;

/// GET /api/v1/insights
pub async fn handle_get_insights(State(state): State<AppState>) -> Json<InsightSnapshot> {
    Json(state.session.snapshot().await.insights)
}

/// GET /api/v1/actions
pub async fn handle_get_action_plan(State(state): State<AppState>) -> Json<Vec<ActionItem>> {
    Json(state.session.snapshot().await.insights.next_actions)
}
