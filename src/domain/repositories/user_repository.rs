use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::user::User;

/// Repository trait for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError>;

    /// Set the activity flag and return the updated user
    ///
    /// Returns `None` when the user does not exist.
    async fn update_activity(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, RepositoryError>;
}
