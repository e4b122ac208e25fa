use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::middleware::AdminAuth;
use crate::api::state::AppState;
use crate::domain::pull_request::PullRequestShort;
use crate::domain::user::User;

#[derive(Debug, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeactivateRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeactivateResponse {
    pub message: &'static str,
    pub deactivated_users: Vec<String>,
}

/// Toggle a user's availability without touching their assignments
///
/// POST /users/setIsActive (admin)
pub async fn set_is_active(
    _admin: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let Json(req) = body?;

    let user = state
        .service
        .set_user_activity(&req.user_id, req.is_active)
        .await?;

    Ok(Json(UserEnvelope {
        user: UserResponse::from(user),
    }))
}

/// Pull requests a user reviews, newest first
///
/// GET /users/getReview?user_id=...
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Query(query) = query?;

    let pull_requests = state.service.get_review(&query.user_id).await?;

    Ok(Json(ReviewResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}

/// Deactivate several users, moving their open reviews to teammates
///
/// POST /users/bulkDeactivate (admin)
pub async fn bulk_deactivate(
    _admin: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<BulkDeactivateRequest>, JsonRejection>,
) -> Result<Json<BulkDeactivateResponse>, ApiError> {
    let Json(req) = body?;

    let deactivated_users = state.service.bulk_deactivate(&req.user_ids).await?;

    Ok(Json(BulkDeactivateResponse {
        message: "Users deactivated successfully",
        deactivated_users,
    }))
}
