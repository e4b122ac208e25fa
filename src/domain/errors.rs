use thiserror::Error;

use super::repositories::RepositoryError;

/// Errors produced by the assignment engine
///
/// Every variant except `Storage` and `BulkDeactivateInterrupted` is a
/// rejected business rule and leaves persisted state untouched.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("team {0} already exists")]
    TeamExists(String),

    #[error("pull request {0} already exists")]
    PrExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("pull request {0} is merged")]
    PrMerged(String),

    #[error("user {user_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    #[error("no active replacement candidate for pull request {0}")]
    NoCandidate(String),

    #[error("cannot deactivate {user_id}: pull request {pull_request_id} has no replacement reviewer")]
    BulkDeactivateFailed {
        user_id: String,
        pull_request_id: String,
    },

    /// The commit phase of a bulk deactivation stopped part way.
    /// `deactivated` lists the users already switched off.
    #[error("bulk deactivation interrupted after deactivating {deactivated:?}: {source}")]
    BulkDeactivateInterrupted {
        deactivated: Vec<String>,
        #[source]
        source: Box<DomainError>,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl DomainError {
    pub(crate) fn user_not_found(user_id: &str) -> Self {
        Self::NotFound(format!("user {}", user_id))
    }

    pub(crate) fn team_not_found(team_name: &str) -> Self {
        Self::NotFound(format!("team {}", team_name))
    }

    pub(crate) fn pull_request_not_found(pull_request_id: &str) -> Self {
        Self::NotFound(format!("pull request {}", pull_request_id))
    }
}
