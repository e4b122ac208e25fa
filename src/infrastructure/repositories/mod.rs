// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory_repository;
pub mod postgres_pull_request_repository;
pub mod postgres_team_repository;
pub mod postgres_user_repository;

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repositories::{RepositoryError, Repositories};

pub use in_memory_repository::InMemoryRepository;
pub use postgres_pull_request_repository::PostgresPullRequestRepository;
pub use postgres_team_repository::PostgresTeamRepository;
pub use postgres_user_repository::PostgresUserRepository;

/// Wires every port to PostgreSQL adapters sharing one pool
pub fn postgres(pool: PgPool) -> Repositories {
    let pull_requests = Arc::new(PostgresPullRequestRepository::new(pool.clone()));
    Repositories {
        teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
        users: Arc::new(PostgresUserRepository::new(pool)),
        pull_requests: pull_requests.clone(),
        stats: pull_requests,
    }
}

/// Wires every port to a fresh in-memory store
pub fn in_memory() -> Repositories {
    Repositories::from_backend(Arc::new(InMemoryRepository::new()))
}

pub(crate) fn database_error(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| RepositoryError::Database(format!("{}: {}", context, e))
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}
