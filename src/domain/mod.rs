// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod errors;
pub mod pull_request;
pub mod repositories;
pub mod stats;
pub mod team;
pub mod user;

pub use errors::DomainError;
pub use pull_request::{PullRequest, PullRequestShort, PullRequestStatus, MAX_REVIEWERS};
pub use stats::ReviewStat;
pub use team::{Team, TeamMember};
pub use user::User;

/// Rejects empty identifiers with a validation error naming the field
pub(crate) fn ensure_identifier(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
