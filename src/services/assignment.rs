//! Reviewer assignment engine.
//!
//! Stateless between calls apart from its random source. Every workflow is a
//! fixed sequence of repository calls; mutating workflows are serialized
//! inside this process by a write gate, but nothing here guards against a
//! second process writing the same rows.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, instrument, warn};

use super::selection;
use crate::domain::repositories::Repositories;
use crate::domain::{
    ensure_identifier, DomainError, PullRequest, PullRequestShort, PullRequestStatus, ReviewStat,
    Team, User,
};

/// Result of swapping one reviewer on an open pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    pub replaced_by: String,
}

/// Replacement chosen during the feasibility pass, keyed by
/// `(deactivated user, pull request)`
type BulkPlan = HashMap<(String, String), String>;

/// Assigns, reassigns and releases pull request reviewers
pub struct AssignmentService {
    repos: Repositories,
    rng: Mutex<StdRng>,
    write_gate: tokio::sync::Mutex<()>,
}

impl AssignmentService {
    /// Creates a service drawing from an entropy-seeded generator
    pub fn new(repos: Repositories) -> Self {
        Self::with_rng(repos, StdRng::from_entropy())
    }

    /// Creates a service with an injected generator
    pub fn with_rng(repos: Repositories, rng: StdRng) -> Self {
        Self {
            repos,
            rng: Mutex::new(rng),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    // The guard is dropped before the closure returns, never held across an await.
    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    // ===== Teams and users =====

    /// Registers a team and upserts its members
    #[instrument(skip(self, team), fields(team_name = %team.team_name()))]
    pub async fn create_team(&self, team: Team) -> Result<Team, DomainError> {
        let _guard = self.write_gate.lock().await;

        if self.repos.teams.exists(team.team_name()).await? {
            warn!("team already exists");
            return Err(DomainError::TeamExists(team.team_name().to_string()));
        }

        self.repos.teams.create(&team).await?;
        info!(members = team.members().len(), "team created");

        Ok(team)
    }

    #[instrument(skip(self))]
    pub async fn get_team(&self, team_name: &str) -> Result<Team, DomainError> {
        ensure_identifier("team_name", team_name)?;

        self.repos
            .teams
            .find_by_name(team_name)
            .await?
            .ok_or_else(|| DomainError::team_not_found(team_name))
    }

    /// Flips a user's activity flag
    ///
    /// Open reviews held by the user are left in place; only
    /// [`bulk_deactivate`](Self::bulk_deactivate) hands them over.
    #[instrument(skip(self))]
    pub async fn set_user_activity(&self, user_id: &str, is_active: bool) -> Result<User, DomainError> {
        ensure_identifier("user_id", user_id)?;
        let _guard = self.write_gate.lock().await;

        if self.repos.users.find_by_id(user_id).await?.is_none() {
            return Err(DomainError::user_not_found(user_id));
        }

        let user = self
            .repos
            .users
            .update_activity(user_id, is_active)
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        info!("user activity updated");

        Ok(user)
    }

    // ===== Pull requests =====

    /// Opens a pull request and assigns up to two reviewers from the
    /// author's team
    #[instrument(skip(self, pull_request_name))]
    pub async fn create_pr(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> Result<PullRequest, DomainError> {
        ensure_identifier("pull_request_id", pull_request_id)?;
        ensure_identifier("author_id", author_id)?;
        let _guard = self.write_gate.lock().await;

        if self.repos.pull_requests.exists(pull_request_id).await? {
            warn!("pull request already exists");
            return Err(DomainError::PrExists(pull_request_id.to_string()));
        }

        let author = self
            .repos
            .users
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(author_id))?;
        let team = self
            .repos
            .teams
            .find_by_name(&author.team_name)
            .await?
            .ok_or_else(|| DomainError::team_not_found(&author.team_name))?;

        let reviewers = self.draw(|rng| selection::select_initial_reviewers(&team, author_id, rng));
        debug!(?reviewers, team_name = %team.team_name(), "initial reviewers selected");

        let pull_request = PullRequest::open(
            pull_request_id,
            pull_request_name,
            author_id,
            reviewers,
            Utc::now(),
        )?;
        self.repos.pull_requests.create(&pull_request).await?;
        info!(
            status = %pull_request.status(),
            reviewers = ?pull_request.assigned_reviewers(),
            "pull request created"
        );

        Ok(pull_request)
    }

    /// Marks a pull request merged
    ///
    /// Merging an already merged pull request returns it unchanged.
    #[instrument(skip(self))]
    pub async fn merge_pr(&self, pull_request_id: &str) -> Result<PullRequest, DomainError> {
        ensure_identifier("pull_request_id", pull_request_id)?;
        let _guard = self.write_gate.lock().await;

        let mut pull_request = self
            .repos
            .pull_requests
            .find_by_id(pull_request_id)
            .await?
            .ok_or_else(|| DomainError::pull_request_not_found(pull_request_id))?;

        if !pull_request.merge(Utc::now()) {
            debug!(status = %pull_request.status(), "pull request already merged");
            return Ok(pull_request);
        }

        self.repos
            .pull_requests
            .update_status(
                pull_request_id,
                pull_request.status(),
                pull_request.merged_at(),
            )
            .await?;
        info!(status = %pull_request.status(), "pull request merged");

        Ok(pull_request)
    }

    /// Replaces one reviewer on an open pull request
    ///
    /// The replacement is drawn from the outgoing reviewer's team.
    #[instrument(skip(self))]
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment, DomainError> {
        ensure_identifier("pull_request_id", pull_request_id)?;
        ensure_identifier("old_user_id", old_user_id)?;
        let _guard = self.write_gate.lock().await;

        let mut pull_request = self
            .repos
            .pull_requests
            .find_by_id(pull_request_id)
            .await?
            .ok_or_else(|| DomainError::pull_request_not_found(pull_request_id))?;

        if !pull_request.is_open() {
            warn!("reassignment rejected: pull request merged");
            return Err(DomainError::PrMerged(pull_request_id.to_string()));
        }
        if !pull_request.has_reviewer(old_user_id) {
            warn!("reassignment rejected: user not assigned");
            return Err(DomainError::NotAssigned {
                pull_request_id: pull_request_id.to_string(),
                user_id: old_user_id.to_string(),
            });
        }

        let old_reviewer = self
            .repos
            .users
            .find_by_id(old_user_id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(old_user_id))?;
        let team = self
            .repos
            .teams
            .find_by_name(&old_reviewer.team_name)
            .await?
            .ok_or_else(|| DomainError::team_not_found(&old_reviewer.team_name))?;

        let replaced_by = self
            .draw(|rng| {
                selection::select_replacement_reviewer(
                    &team,
                    old_user_id,
                    pull_request.author_id(),
                    pull_request.assigned_reviewers(),
                    rng,
                )
            })
            .ok_or_else(|| {
                warn!("reassignment rejected: no candidate");
                DomainError::NoCandidate(pull_request_id.to_string())
            })?;

        pull_request.replace_reviewer(old_user_id, replaced_by.clone())?;
        self.repos
            .pull_requests
            .update_reviewers(pull_request_id, pull_request.assigned_reviewers())
            .await?;
        info!(%replaced_by, "reviewer reassigned");

        Ok(Reassignment {
            pull_request,
            replaced_by,
        })
    }

    /// Pull requests, in any status, the user is reviewing
    #[instrument(skip(self))]
    pub async fn get_review(&self, user_id: &str) -> Result<Vec<PullRequestShort>, DomainError> {
        ensure_identifier("user_id", user_id)?;
        Ok(self.repos.pull_requests.find_by_reviewer(user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn review_stats(&self) -> Result<Vec<ReviewStat>, DomainError> {
        Ok(self.repos.stats.review_stats().await?)
    }

    // ===== Bulk deactivation =====

    /// Deactivates users and hands their open reviews to active teammates
    ///
    /// Runs in two phases. The first plans a replacement for every open
    /// review held by any listed user without writing anything, and fails
    /// with [`DomainError::BulkDeactivateFailed`] if one review has nowhere to
    /// go. The second re-reads each review, applies the plan and deactivates
    /// users in request order. A failure in the second phase returns
    /// [`DomainError::BulkDeactivateInterrupted`] carrying the users already
    /// deactivated.
    ///
    /// Listed users are never chosen as replacements for one another.
    /// Repeated ids are handled once.
    #[instrument(skip(self, user_ids), fields(requested = user_ids.len()))]
    pub async fn bulk_deactivate(&self, user_ids: &[String]) -> Result<Vec<String>, DomainError> {
        for user_id in user_ids {
            ensure_identifier("user_id", user_id)?;
        }

        let mut seen = HashSet::new();
        let batch: Vec<&str> = user_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();
        let unavailable: HashSet<&str> = batch.iter().copied().collect();

        let _guard = self.write_gate.lock().await;

        let plan = self.plan_bulk_deactivation(&batch, &unavailable).await?;
        info!(users = batch.len(), swaps = plan.len(), "bulk deactivation planned");

        let mut deactivated = Vec::with_capacity(batch.len());
        for user_id in &batch {
            if let Err(source) = self.commit_deactivation(user_id, &unavailable, &plan).await {
                error!(%user_id, ?deactivated, error = %source, "bulk deactivation interrupted");
                return Err(DomainError::BulkDeactivateInterrupted {
                    deactivated,
                    source: Box::new(source),
                });
            }
            deactivated.push(user_id.to_string());
        }
        info!(?deactivated, "bulk deactivation complete");

        Ok(deactivated)
    }

    /// Feasibility pass: no writes
    ///
    /// Swaps are applied to working copies so that later users see the
    /// reviewer sets earlier users leave behind.
    async fn plan_bulk_deactivation(
        &self,
        batch: &[&str],
        unavailable: &HashSet<&str>,
    ) -> Result<BulkPlan, DomainError> {
        let mut plan = BulkPlan::new();
        let mut teams: HashMap<String, Team> = HashMap::new();
        let mut working: HashMap<String, PullRequest> = HashMap::new();

        for user_id in batch {
            let user = self
                .repos
                .users
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| DomainError::user_not_found(user_id))?;

            if !teams.contains_key(&user.team_name) {
                let team = self
                    .repos
                    .teams
                    .find_by_name(&user.team_name)
                    .await?
                    .ok_or_else(|| DomainError::team_not_found(&user.team_name))?;
                teams.insert(user.team_name.clone(), team);
            }

            let open_reviews = self
                .repos
                .pull_requests
                .find_by_reviewer(user_id)
                .await?
                .into_iter()
                .filter(|pr| pr.status == PullRequestStatus::Open);

            for short in open_reviews {
                let pull_request = match working.entry(short.pull_request_id.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        match self.repos.pull_requests.find_by_id(&short.pull_request_id).await? {
                            Some(pr) => entry.insert(pr),
                            None => continue,
                        }
                    }
                };
                if !pull_request.is_open() || !pull_request.has_reviewer(user_id) {
                    continue;
                }

                let Some(team) = teams.get(&user.team_name) else {
                    return Err(DomainError::team_not_found(&user.team_name));
                };
                let candidates: Vec<&str> = selection::replacement_candidates(
                    team,
                    user_id,
                    pull_request.author_id(),
                    pull_request.assigned_reviewers(),
                )
                .into_iter()
                .filter(|id| !unavailable.contains(id))
                .collect();

                let Some(replacement) = self.draw(|rng| selection::choose(&candidates, rng)) else {
                    warn!(
                        %user_id,
                        pull_request_id = %pull_request.id(),
                        "bulk deactivation infeasible"
                    );
                    return Err(DomainError::BulkDeactivateFailed {
                        user_id: user_id.to_string(),
                        pull_request_id: pull_request.id().to_string(),
                    });
                };

                pull_request.replace_reviewer(user_id, replacement.clone())?;
                plan.insert(
                    (user_id.to_string(), pull_request.id().to_string()),
                    replacement,
                );
            }
        }

        Ok(plan)
    }

    /// Commit pass for one user: hand over each open review, then deactivate
    async fn commit_deactivation(
        &self,
        user_id: &str,
        unavailable: &HashSet<&str>,
        plan: &BulkPlan,
    ) -> Result<(), DomainError> {
        let user = self
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        let team = self
            .repos
            .teams
            .find_by_name(&user.team_name)
            .await?
            .ok_or_else(|| DomainError::team_not_found(&user.team_name))?;

        let open_reviews: Vec<PullRequestShort> = self
            .repos
            .pull_requests
            .find_by_reviewer(user_id)
            .await?
            .into_iter()
            .filter(|pr| pr.status == PullRequestStatus::Open)
            .collect();

        for short in open_reviews {
            let Some(mut pull_request) = self
                .repos
                .pull_requests
                .find_by_id(&short.pull_request_id)
                .await?
            else {
                continue;
            };
            if !pull_request.is_open() || !pull_request.has_reviewer(user_id) {
                continue;
            }

            let candidates: Vec<&str> = selection::replacement_candidates(
                &team,
                user_id,
                pull_request.author_id(),
                pull_request.assigned_reviewers(),
            )
            .into_iter()
            .filter(|id| !unavailable.contains(id))
            .collect();

            // The plan was drawn against an earlier read; keep it only while
            // it still satisfies the pool rules.
            let planned = plan
                .get(&(user_id.to_string(), pull_request.id().to_string()))
                .filter(|planned| candidates.contains(&planned.as_str()))
                .cloned();
            let replacement = match planned {
                Some(replacement) => replacement,
                None => self
                    .draw(|rng| selection::choose(&candidates, rng))
                    .ok_or_else(|| DomainError::NoCandidate(pull_request.id().to_string()))?,
            };

            pull_request.replace_reviewer(user_id, replacement.clone())?;
            self.repos
                .pull_requests
                .update_reviewers(pull_request.id(), pull_request.assigned_reviewers())
                .await?;
            debug!(
                %user_id,
                pull_request_id = %pull_request.id(),
                %replacement,
                "review handed over"
            );
        }

        self.repos
            .users
            .update_activity(user_id, false)
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;

        Ok(())
    }
}
