use async_trait::async_trait;
use sqlx::PgPool;

use super::database_error;
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::domain::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    username: String,
    team_name: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            user_id: r.user_id,
            username: r.username,
            team_name: r.team_name,
            is_active: r.is_active,
        }
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("Failed to find user by id"))?;

        Ok(row.map(User::from))
    }

    async fn update_activity(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET is_active = $1
            WHERE user_id = $2
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("Failed to update user activity"))?;

        Ok(row.map(User::from))
    }
}
