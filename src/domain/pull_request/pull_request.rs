use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use super::value_objects::PullRequestStatus;
use crate::domain::{ensure_identifier, DomainError};

/// Upper bound on reviewers assigned to one pull request
pub const MAX_REVIEWERS: usize = 2;

// Postgres TIMESTAMPTZ keeps microseconds; anything finer would not survive a
// round trip through storage.
const TIMESTAMP_PRECISION: u16 = 6;

/// Pull request aggregate root
///
/// # Invariants
/// - At most [`MAX_REVIEWERS`] reviewers, no duplicates
/// - The author is never one of its reviewers
/// - Reviewers only change while the pull request is open
/// - `merged_at` is set exactly when the status is `Merged`
///
/// # Example
/// ```
/// use chrono::Utc;
/// use pr_reviewer_api::domain::{PullRequest, PullRequestStatus};
///
/// let mut pr = PullRequest::open(
///     "pr-1",
///     "Add login",
///     "u1",
///     vec!["u2".to_string(), "u3".to_string()],
///     Utc::now(),
/// )
/// .expect("valid pull request");
///
/// assert_eq!(pr.status(), PullRequestStatus::Open);
/// assert!(pr.merge(Utc::now()));
/// assert!(!pr.merge(Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    id: String,
    name: String,
    author_id: String,
    status: PullRequestStatus,
    assigned_reviewers: Vec<String>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Opens a new pull request with an initial reviewer set
    ///
    /// # Returns
    /// * `Ok(PullRequest)` - Open pull request
    /// * `Err(DomainError::Validation)` - If an id is empty or the reviewer
    ///   set breaks an invariant
    pub fn open(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
        assigned_reviewers: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let author_id = author_id.into();
        ensure_identifier("pull_request_id", &id)?;
        ensure_identifier("author_id", &author_id)?;

        if assigned_reviewers.len() > MAX_REVIEWERS {
            return Err(DomainError::Validation(format!(
                "pull request {} cannot have more than {} reviewers",
                id, MAX_REVIEWERS
            )));
        }
        let mut seen = HashSet::with_capacity(assigned_reviewers.len());
        for reviewer in &assigned_reviewers {
            if reviewer == &author_id {
                return Err(DomainError::Validation(format!(
                    "author {} cannot review pull request {}",
                    author_id, id
                )));
            }
            if !seen.insert(reviewer.as_str()) {
                return Err(DomainError::Validation(format!(
                    "reviewer {} is assigned twice to pull request {}",
                    reviewer, id
                )));
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            author_id,
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at: created_at.trunc_subsecs(TIMESTAMP_PRECISION),
            merged_at: None,
        })
    }

    /// Moves the pull request to `Merged`
    ///
    /// Returns `false` and leaves `merged_at` untouched when the pull request
    /// is already merged.
    pub fn merge(&mut self, merged_at: DateTime<Utc>) -> bool {
        let next_status = PullRequestStatus::Merged;
        if !self.status.can_transition_to(next_status) {
            return false;
        }

        self.status = next_status;
        self.merged_at = Some(merged_at.trunc_subsecs(TIMESTAMP_PRECISION));
        true
    }

    /// Swaps one reviewer for another, keeping slot order and count
    ///
    /// # Business Rules
    /// - Pull request must be open
    /// - `old_user_id` must currently be assigned
    /// - `new_user_id` must not be the author or an already assigned reviewer
    pub fn replace_reviewer(
        &mut self,
        old_user_id: &str,
        new_user_id: impl Into<String>,
    ) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::PrMerged(self.id.clone()));
        }

        let slot = self
            .assigned_reviewers
            .iter()
            .position(|r| r == old_user_id)
            .ok_or_else(|| DomainError::NotAssigned {
                pull_request_id: self.id.clone(),
                user_id: old_user_id.to_string(),
            })?;

        let new_user_id = new_user_id.into();
        if new_user_id == self.author_id || self.has_reviewer(&new_user_id) {
            return Err(DomainError::Validation(format!(
                "user {} cannot replace {} on pull request {}",
                new_user_id, old_user_id, self.id
            )));
        }

        self.assigned_reviewers[slot] = new_user_id;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.status == PullRequestStatus::Open
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    // ===== Getters =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn status(&self) -> PullRequestStatus {
        self.status
    }

    pub fn assigned_reviewers(&self) -> &[String] {
        &self.assigned_reviewers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Summary row used by reviewer queues
    pub fn to_short(&self) -> PullRequestShort {
        PullRequestShort {
            pull_request_id: self.id.clone(),
            pull_request_name: self.name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }

    /// Reconstructs a PullRequest from persistence layer data
    ///
    /// Bypasses validation; only to be used by repository implementations.
    pub fn from_persistence(
        id: String,
        name: String,
        author_id: String,
        status: PullRequestStatus,
        assigned_reviewers: Vec<String>,
        created_at: DateTime<Utc>,
        merged_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            author_id,
            status,
            assigned_reviewers,
            created_at,
            merged_at,
        }
    }
}

/// Pull request summary without reviewers or timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reviewers(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn open_pr(ids: &[&str]) -> PullRequest {
        PullRequest::open("pr-1", "Feature", "u1", reviewers(ids), Utc::now()).unwrap()
    }

    #[test]
    fn open_pull_request_starts_open_without_merge_time() {
        let pr = open_pr(&["u2", "u3"]);

        assert_eq!(pr.status(), PullRequestStatus::Open);
        assert!(pr.merged_at().is_none());
        assert_eq!(pr.assigned_reviewers(), &["u2", "u3"]);
    }

    #[test]
    fn open_allows_zero_reviewers() {
        let pr = open_pr(&[]);
        assert!(pr.assigned_reviewers().is_empty());
    }

    #[test]
    fn open_rejects_too_many_reviewers() {
        let result = PullRequest::open("pr-1", "x", "u1", reviewers(&["u2", "u3", "u4"]), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn open_rejects_author_as_reviewer() {
        let result = PullRequest::open("pr-1", "x", "u1", reviewers(&["u1"]), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg.contains("author")));
    }

    #[test]
    fn open_rejects_duplicate_reviewers() {
        let result = PullRequest::open("pr-1", "x", "u1", reviewers(&["u2", "u2"]), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg.contains("twice")));
    }

    #[test]
    fn open_rejects_empty_ids() {
        assert!(PullRequest::open("", "x", "u1", vec![], Utc::now()).is_err());
        assert!(PullRequest::open("pr-1", "x", "", vec![], Utc::now()).is_err());
    }

    #[test]
    fn merge_is_idempotent_and_keeps_first_timestamp() {
        let mut pr = open_pr(&["u2"]);
        let first = Utc::now();

        assert!(pr.merge(first));
        assert!(!pr.merge(first + chrono::Duration::seconds(10)));
        assert_eq!(pr.status(), PullRequestStatus::Merged);
        assert_eq!(pr.merged_at(), Some(first.trunc_subsecs(6)));
    }

    #[test]
    fn timestamps_are_kept_to_microseconds() {
        let precise = Utc.with_ymd_and_hms(2025, 1, 1, 2, 5, 27).unwrap()
            + chrono::Duration::nanoseconds(764_593_150);

        let mut pr = PullRequest::open("pr-1", "x", "u1", vec![], precise).unwrap();
        pr.merge(precise);

        assert_eq!(pr.created_at().timestamp_subsec_nanos(), 764_593_000);
        assert_eq!(pr.merged_at().map(|t| t.timestamp_subsec_nanos()), Some(764_593_000));
    }

    #[test]
    fn replace_reviewer_keeps_slot_order() {
        let mut pr = open_pr(&["u2", "u3"]);

        pr.replace_reviewer("u2", "u4").unwrap();

        assert_eq!(pr.assigned_reviewers(), &["u4", "u3"]);
    }

    #[test]
    fn replace_reviewer_on_merged_fails() {
        let mut pr = open_pr(&["u2"]);
        pr.merge(Utc::now());

        let result = pr.replace_reviewer("u2", "u3");

        assert!(matches!(result, Err(DomainError::PrMerged(id)) if id == "pr-1"));
        assert_eq!(pr.assigned_reviewers(), &["u2"]);
    }

    #[test]
    fn replace_unassigned_reviewer_fails() {
        let mut pr = open_pr(&["u2"]);

        let result = pr.replace_reviewer("u9", "u3");

        assert!(matches!(result, Err(DomainError::NotAssigned { user_id, .. }) if user_id == "u9"));
    }

    #[test]
    fn replace_with_author_or_existing_reviewer_fails() {
        let mut pr = open_pr(&["u2", "u3"]);

        assert!(pr.replace_reviewer("u2", "u1").is_err());
        assert!(pr.replace_reviewer("u2", "u3").is_err());
        assert_eq!(pr.assigned_reviewers(), &["u2", "u3"]);
    }

    #[test]
    fn to_short_copies_identity_and_status() {
        let pr = open_pr(&["u2"]);
        let short = pr.to_short();

        assert_eq!(short.pull_request_id, "pr-1");
        assert_eq!(short.pull_request_name, "Feature");
        assert_eq!(short.author_id, "u1");
        assert_eq!(short.status, PullRequestStatus::Open);
    }
}
