use std::net::SocketAddr;

use pr_reviewer_api::api::{self, AppState};
use pr_reviewer_api::config::{Config, StorageBackend};
use pr_reviewer_api::infrastructure::{database, repositories};
use pr_reviewer_api::services::AssignmentService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    let repos = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = database::connect(&config.database_url, config.database_max_connections).await?;
            database::run_migrations(&pool).await?;
            repositories::postgres(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; state is lost on shutdown");
            repositories::in_memory()
        }
    };

    let state = AppState::new(AssignmentService::new(repos), config.admin_token.as_str());
    let app = api::router(state, config.request_timeout);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pr_reviewer_api=info,tower_http=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
