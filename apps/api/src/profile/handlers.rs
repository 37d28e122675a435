use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::profile::models::UserProfile;
use crate::session::state::ProfileUpdate;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.session.snapshot().await.profile)
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Json<UserProfile> {
    Json(state.session.update_profile(update).await)
}

/// POST /api/v1/profile/gaps/:area/remediation
///
/// Starts remediation for one skill gap. `area` is the percent-encoded gap name.
pub async fn handle_start_remediation(
    State(state): State<AppState>,
    Path(area): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.session.start_remediation(&area).await?;
    Ok(Json(profile))
}
