//! In-memory implementation of every repository port.
//!
//! Useful for testing and for running the server without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::pull_request::{PullRequest, PullRequestShort, PullRequestStatus};
use crate::domain::repositories::{
    PullRequestRepository, RepositoryError, ReviewStatsRepository, TeamRepository, UserRepository,
};
use crate::domain::stats::ReviewStat;
use crate::domain::team::Team;
use crate::domain::user::User;

#[derive(Debug, Default)]
struct Store {
    teams: HashSet<String>,
    // Ordered by user id, matching the Postgres roster order
    users: BTreeMap<String, User>,
    pull_requests: HashMap<String, PullRequest>,
}

/// Thread-safe store guarded by a single RwLock
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, RepositoryError> {
        self.store
            .read()
            .map_err(|_| RepositoryError::Lock("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, RepositoryError> {
        self.store
            .write()
            .map_err(|_| RepositoryError::Lock("Failed to acquire write lock".to_string()))
    }
}

#[async_trait]
impl TeamRepository for InMemoryRepository {
    async fn exists(&self, team_name: &str) -> Result<bool, RepositoryError> {
        Ok(self.read()?.teams.contains(team_name))
    }

    async fn create(&self, team: &Team) -> Result<(), RepositoryError> {
        let mut store = self.write()?;
        store.teams.insert(team.team_name().to_string());
        for member in team.members() {
            store.users.insert(
                member.user_id.clone(),
                User {
                    user_id: member.user_id.clone(),
                    username: member.username.clone(),
                    team_name: team.team_name().to_string(),
                    is_active: member.is_active,
                },
            );
        }
        Ok(())
    }

    async fn find_by_name(&self, team_name: &str) -> Result<Option<Team>, RepositoryError> {
        let store = self.read()?;
        let members: Vec<_> = store
            .users
            .values()
            .filter(|u| u.team_name == team_name)
            .map(User::as_member)
            .collect();

        if members.is_empty() {
            return Ok(None);
        }
        Ok(Some(Team::from_persistence(team_name.to_string(), members)))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    async fn update_activity(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, RepositoryError> {
        let mut store = self.write()?;
        Ok(store.users.get_mut(user_id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryRepository {
    async fn exists(&self, pull_request_id: &str) -> Result<bool, RepositoryError> {
        Ok(self.read()?.pull_requests.contains_key(pull_request_id))
    }

    async fn create(&self, pull_request: &PullRequest) -> Result<(), RepositoryError> {
        let mut store = self.write()?;
        if store.pull_requests.contains_key(pull_request.id()) {
            return Err(RepositoryError::Database(format!(
                "duplicate key: pull request {}",
                pull_request.id()
            )));
        }
        store
            .pull_requests
            .insert(pull_request.id().to_string(), pull_request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        pull_request_id: &str,
    ) -> Result<Option<PullRequest>, RepositoryError> {
        Ok(self.read()?.pull_requests.get(pull_request_id).cloned())
    }

    async fn update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut store = self.write()?;
        if let Some(existing) = store.pull_requests.get_mut(pull_request_id) {
            *existing = PullRequest::from_persistence(
                existing.id().to_string(),
                existing.name().to_string(),
                existing.author_id().to_string(),
                status,
                existing.assigned_reviewers().to_vec(),
                existing.created_at(),
                merged_at,
            );
        }
        Ok(())
    }

    async fn update_reviewers(
        &self,
        pull_request_id: &str,
        reviewers: &[String],
    ) -> Result<(), RepositoryError> {
        let mut store = self.write()?;
        if let Some(existing) = store.pull_requests.get_mut(pull_request_id) {
            *existing = PullRequest::from_persistence(
                existing.id().to_string(),
                existing.name().to_string(),
                existing.author_id().to_string(),
                existing.status(),
                reviewers.to_vec(),
                existing.created_at(),
                existing.merged_at(),
            );
        }
        Ok(())
    }

    async fn find_by_reviewer(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, RepositoryError> {
        let store = self.read()?;
        let mut matching: Vec<&PullRequest> = store
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        Ok(matching.into_iter().map(PullRequest::to_short).collect())
    }
}

#[async_trait]
impl ReviewStatsRepository for InMemoryRepository {
    async fn review_stats(&self) -> Result<Vec<ReviewStat>, RepositoryError> {
        let store = self.read()?;
        let mut stats: Vec<ReviewStat> = store
            .users
            .values()
            .map(|user| ReviewStat {
                user_id: user.user_id.clone(),
                username: user.username.clone(),
                review_count: store
                    .pull_requests
                    .values()
                    .filter(|pr| pr.is_open() && pr.has_reviewer(&user.user_id))
                    .count() as i64,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.review_count
                .cmp(&a.review_count)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(stats)
    }
}
