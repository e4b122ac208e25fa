use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::pull_request::{PullRequest, PullRequestStatus};

#[derive(Debug, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

/// Full pull request as returned by every mutation
#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<&PullRequest> for PullRequestResponse {
    fn from(pr: &PullRequest) -> Self {
        Self {
            pull_request_id: pr.id().to_string(),
            pull_request_name: pr.name().to_string(),
            author_id: pr.author_id().to_string(),
            status: pr.status(),
            assigned_reviewers: pr.assigned_reviewers().to_vec(),
            created_at: pr.created_at(),
            merged_at: pr.merged_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestResponse,
    pub replaced_by: String,
}

/// Open a pull request and assign reviewers
///
/// POST /pullRequest/create
pub async fn create_pull_request(
    State(state): State<AppState>,
    body: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ApiError> {
    let Json(req) = body?;

    let pr = state
        .service
        .create_pr(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestEnvelope {
            pr: PullRequestResponse::from(&pr),
        }),
    ))
}

/// Merge a pull request; merging twice is not an error
///
/// POST /pullRequest/merge
pub async fn merge_pull_request(
    State(state): State<AppState>,
    body: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestEnvelope>, ApiError> {
    let Json(req) = body?;

    let pr = state.service.merge_pr(&req.pull_request_id).await?;

    Ok(Json(PullRequestEnvelope {
        pr: PullRequestResponse::from(&pr),
    }))
}

/// Replace one reviewer
///
/// POST /pullRequest/reassign
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    body: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let Json(req) = body?;

    let reassignment = state
        .service
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;

    Ok(Json(ReassignResponse {
        pr: PullRequestResponse::from(&reassignment.pull_request),
        replaced_by: reassignment.replaced_by,
    }))
}
