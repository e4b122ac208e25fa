use serde::{Deserialize, Serialize};

/// Lifecycle status of a pull request
///
/// # Status Transitions
/// ```text
/// Open -> Merged
/// ```
/// `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pr_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    /// Accepting review changes
    Open,
    /// Merged; reviewers are frozen
    Merged,
}

impl PullRequestStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use pr_reviewer_api::domain::PullRequestStatus;
    ///
    /// assert!(PullRequestStatus::Open.can_transition_to(PullRequestStatus::Merged));
    /// assert!(!PullRequestStatus::Merged.can_transition_to(PullRequestStatus::Open));
    /// ```
    pub fn can_transition_to(&self, next: PullRequestStatus) -> bool {
        use PullRequestStatus::*;
        matches!((self, next), (Open, Merged))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PullRequestStatus::Merged)
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullRequestStatus::Open => write!(f, "OPEN"),
            PullRequestStatus::Merged => write!(f, "MERGED"),
        }
    }
}
