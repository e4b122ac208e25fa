use async_trait::async_trait;
use sqlx::PgPool;

use super::database_error;
use crate::domain::repositories::{RepositoryError, TeamRepository};
use crate::domain::team::{Team, TeamMember};

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: String,
    username: String,
    is_active: bool,
}

/// PostgreSQL implementation of TeamRepository
///
/// Team membership lives on the `users` table; the `teams` table only
/// records that a name has been claimed.
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn exists(&self, team_name: &str) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = $1)
            "#,
        )
        .bind(team_name)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("Failed to check team existence"))
    }

    async fn create(&self, team: &Team) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database_error("Failed to begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO teams (team_name, created_at)
            VALUES ($1, NOW())
            ON CONFLICT (team_name) DO NOTHING
            "#,
        )
        .bind(team.team_name())
        .execute(&mut *tx)
        .await
        .map_err(database_error("Failed to insert team"))?;

        for member in team.members() {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                ON CONFLICT (user_id) DO UPDATE SET
                    username = EXCLUDED.username,
                    team_name = EXCLUDED.team_name,
                    is_active = EXCLUDED.is_active
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(team.team_name())
            .bind(member.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::Database(format!("Failed to upsert user {}: {}", member.user_id, e))
            })?;
        }

        tx.commit()
            .await
            .map_err(database_error("Failed to commit team"))
    }

    async fn find_by_name(&self, team_name: &str) -> Result<Option<Team>, RepositoryError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT user_id, username, is_active
            FROM users
            WHERE team_name = $1
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("Failed to find team members"))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let members = rows
            .into_iter()
            .map(|r| TeamMember::new(r.user_id, r.username, r.is_active))
            .collect();
        Ok(Some(Team::from_persistence(team_name.to_string(), members)))
    }
}
