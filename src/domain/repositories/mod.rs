// Repository ports consumed by the assignment engine
// Adapters in the infrastructure layer implement these traits

pub mod pull_request_repository;
pub mod review_stats_repository;
pub mod team_repository;
pub mod user_repository;

use std::sync::Arc;

use thiserror::Error;

pub use pull_request_repository::PullRequestRepository;
pub use review_stats_repository::ReviewStatsRepository;
pub use team_repository::TeamRepository;
pub use user_repository::UserRepository;

/// Opaque storage failure, propagated unchanged by the engine
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),

    #[error("storage lock poisoned: {0}")]
    Lock(String),
}

/// Handles to every port the engine needs
///
/// Cheap to clone; each field is shared.
#[derive(Clone)]
pub struct Repositories {
    pub teams: Arc<dyn TeamRepository>,
    pub users: Arc<dyn UserRepository>,
    pub pull_requests: Arc<dyn PullRequestRepository>,
    pub stats: Arc<dyn ReviewStatsRepository>,
}

impl Repositories {
    /// Wires every port to a single backend
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TeamRepository + UserRepository + PullRequestRepository + ReviewStatsRepository + 'static,
    {
        Self {
            teams: backend.clone(),
            users: backend.clone(),
            pull_requests: backend.clone(),
            stats: backend,
        }
    }
}
