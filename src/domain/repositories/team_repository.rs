use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::team::Team;

/// Repository trait for Team aggregate
///
/// Defines the contract for persisting and retrieving teams.
/// Implementations should handle database-specific details.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Checks whether a team row exists under this name
    async fn exists(&self, team_name: &str) -> Result<bool, RepositoryError>;

    /// Persist the team and its members atomically
    ///
    /// Members whose user id already exists are moved into this team with
    /// their username and activity overwritten.
    async fn create(&self, team: &Team) -> Result<(), RepositoryError>;

    /// Find a team with its full roster, ordered by user id
    ///
    /// Returns `None` when no user belongs to the team.
    async fn find_by_name(&self, team_name: &str) -> Result<Option<Team>, RepositoryError>;
}
