use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::stats::ReviewStat;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<ReviewStat>,
}

/// Open review load per user
///
/// GET /stats/review-counts
pub async fn review_counts(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.service.review_stats().await?;
    Ok(Json(StatsResponse { stats }))
}
