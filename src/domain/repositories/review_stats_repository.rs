use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::stats::ReviewStat;

/// Read-only reporting over review load
#[async_trait]
pub trait ReviewStatsRepository: Send + Sync {
    /// Open-review count for every user, highest first, ties by user id
    async fn review_stats(&self) -> Result<Vec<ReviewStat>, RepositoryError>;
}
