use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::insights::models::InsightSnapshot;
use crate::rejections::models::RejectionRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRejectionRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitRejectionResponse {
    pub record: RejectionRecord,
    pub insights: InsightSnapshot,
}

/// POST /api/v1/rejections
pub async fn handle_submit_rejection(
    State(state): State<AppState>,
    Json(req): Json<SubmitRejectionRequest>,
) -> Result<(StatusCode, Json<SubmitRejectionResponse>), AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let outcome = state
        .session
        .submit_feedback(&req.text)
        .await
        .map_err(|e| AppError::from_submit(e, &req.text))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRejectionResponse {
            record: outcome.record,
            insights: outcome.insights,
        }),
    ))
}

/// GET /api/v1/rejections
pub async fn handle_list_rejections(State(state): State<AppState>) -> Json<Vec<RejectionRecord>> {
    Json(state.session.snapshot().await.rejections)
}
