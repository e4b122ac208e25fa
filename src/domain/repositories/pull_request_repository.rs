use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::pull_request::{PullRequest, PullRequestShort, PullRequestStatus};

/// Repository trait for PullRequest aggregate
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    async fn exists(&self, pull_request_id: &str) -> Result<bool, RepositoryError>;

    /// Insert a new pull request
    async fn create(&self, pull_request: &PullRequest) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, pull_request_id: &str)
        -> Result<Option<PullRequest>, RepositoryError>;

    async fn update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;

    /// Overwrite the reviewer list
    async fn update_reviewers(
        &self,
        pull_request_id: &str,
        reviewers: &[String],
    ) -> Result<(), RepositoryError>;

    /// All pull requests, in any status, naming `user_id` as a reviewer.
    /// Newest first.
    async fn find_by_reviewer(&self, user_id: &str)
        -> Result<Vec<PullRequestShort>, RepositoryError>;
}
