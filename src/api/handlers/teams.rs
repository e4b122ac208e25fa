use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::team::{Team, TeamMember};

/// Team member as it appears on the wire
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamMemberDto {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// Request body for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMemberDto>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberDto>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            team_name: team.team_name().to_string(),
            members: team
                .members()
                .iter()
                .map(|m| TeamMemberDto {
                    user_id: m.user_id.clone(),
                    username: m.username.clone(),
                    is_active: m.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team: TeamResponse,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

/// Create a team and upsert its members
///
/// POST /team/add
pub async fn create_team(
    State(state): State<AppState>,
    body: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let Json(req) = body?;

    let members = req
        .members
        .into_iter()
        .map(|m| TeamMember::new(m.user_id, m.username, m.is_active))
        .collect();
    let team = Team::new(req.team_name, members)?;

    let team = state.service.create_team(team).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team: TeamResponse::from(&team),
        }),
    ))
}

/// Get a team with its members
///
/// GET /team/get?team_name=...
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamResponse>, ApiError> {
    let Query(query) = query?;

    let team = state.service.get_team(&query.team_name).await?;

    Ok(Json(TeamResponse::from(&team)))
}
