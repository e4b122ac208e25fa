use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::domain::repositories::RepositoryError;

/// Opens the PostgreSQL pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    tracing::info!(max_connections, "Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!("Database connected successfully");
    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to run migrations: {}", e)))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
