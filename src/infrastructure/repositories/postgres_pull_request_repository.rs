use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::database_error;
use crate::domain::pull_request::{PullRequest, PullRequestShort, PullRequestStatus};
use crate::domain::repositories::{PullRequestRepository, RepositoryError, ReviewStatsRepository};
use crate::domain::stats::ReviewStat;

#[derive(sqlx::FromRow)]
struct PullRequestRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
    assigned_reviewers: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequestRow> for PullRequest {
    fn from(r: PullRequestRow) -> Self {
        PullRequest::from_persistence(
            r.pull_request_id,
            r.pull_request_name,
            r.author_id,
            r.status,
            r.assigned_reviewers.0,
            r.created_at,
            r.merged_at,
        )
    }
}

#[derive(sqlx::FromRow)]
struct PullRequestShortRow {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
}

#[derive(sqlx::FromRow)]
struct ReviewStatRow {
    user_id: String,
    username: String,
    review_count: i64,
}

/// PostgreSQL implementation of PullRequestRepository
///
/// Reviewers are stored as a JSONB array of user ids; reviewer queues are
/// answered with JSONB containment (`@>`).
pub struct PostgresPullRequestRepository {
    pool: PgPool,
}

impl PostgresPullRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PullRequestRepository for PostgresPullRequestRepository {
    async fn exists(&self, pull_request_id: &str) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = $1)
            "#,
        )
        .bind(pull_request_id)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("Failed to check pull request existence"))
    }

    async fn create(&self, pull_request: &PullRequest) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO pull_requests (
                pull_request_id, pull_request_name, author_id, status,
                assigned_reviewers, created_at, merged_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(pull_request.id())
        .bind(pull_request.name())
        .bind(pull_request.author_id())
        .bind(pull_request.status())
        .bind(Json(pull_request.assigned_reviewers()))
        .bind(pull_request.created_at())
        .bind(pull_request.merged_at())
        .execute(&self.pool)
        .await
        .map_err(database_error("Failed to create pull request"))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        pull_request_id: &str,
    ) -> Result<Option<PullRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT
                pull_request_id, pull_request_name, author_id, status,
                assigned_reviewers, created_at, merged_at
            FROM pull_requests
            WHERE pull_request_id = $1
            "#,
        )
        .bind(pull_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("Failed to find pull request by id"))?;

        Ok(row.map(PullRequest::from))
    }

    async fn update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE pull_requests
            SET status = $1, merged_at = $2
            WHERE pull_request_id = $3
            "#,
        )
        .bind(status)
        .bind(merged_at)
        .bind(pull_request_id)
        .execute(&self.pool)
        .await
        .map_err(database_error("Failed to update pull request status"))?;

        Ok(())
    }

    async fn update_reviewers(
        &self,
        pull_request_id: &str,
        reviewers: &[String],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE pull_requests
            SET assigned_reviewers = $1
            WHERE pull_request_id = $2
            "#,
        )
        .bind(Json(reviewers))
        .bind(pull_request_id)
        .execute(&self.pool)
        .await
        .map_err(database_error("Failed to update pull request reviewers"))?;

        Ok(())
    }

    async fn find_by_reviewer(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, RepositoryError> {
        let rows = sqlx::query_as::<_, PullRequestShortRow>(
            r#"
            SELECT pull_request_id, pull_request_name, author_id, status
            FROM pull_requests
            WHERE assigned_reviewers @> jsonb_build_array($1::text)
            ORDER BY created_at DESC, pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("Failed to find pull requests by reviewer"))?;

        Ok(rows
            .into_iter()
            .map(|r| PullRequestShort {
                pull_request_id: r.pull_request_id,
                pull_request_name: r.pull_request_name,
                author_id: r.author_id,
                status: r.status,
            })
            .collect())
    }
}

#[async_trait]
impl ReviewStatsRepository for PostgresPullRequestRepository {
    async fn review_stats(&self) -> Result<Vec<ReviewStat>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewStatRow>(
            r#"
            SELECT
                u.user_id,
                u.username,
                (
                    SELECT COUNT(*)
                    FROM pull_requests pr
                    WHERE pr.status = 'OPEN'
                      AND pr.assigned_reviewers @> jsonb_build_array(u.user_id)
                ) AS review_count
            FROM users u
            ORDER BY review_count DESC, u.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("Failed to compute review stats"))?;

        Ok(rows
            .into_iter()
            .map(|r| ReviewStat {
                user_id: r.user_id,
                username: r.username,
                review_count: r.review_count,
            })
            .collect())
    }
}
