use std::collections::HashSet;

use super::value_objects::TeamMember;
use crate::domain::{ensure_identifier, DomainError};

/// Team aggregate root
///
/// A named roster of users. Reviewer candidates are always drawn from a
/// team's roster in roster order.
///
/// # Invariants
/// - Team name cannot be empty
/// - Member ids cannot be empty
/// - A user appears at most once in the roster
///
/// # Example
/// ```
/// use pr_reviewer_api::domain::team::{Team, TeamMember};
///
/// let team = Team::new(
///     "backend",
///     vec![
///         TeamMember::new("u1", "Alice", true),
///         TeamMember::new("u2", "Bob", false),
///     ],
/// )
/// .expect("valid team");
///
/// assert_eq!(team.team_name(), "backend");
/// assert_eq!(team.active_members().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    team_name: String,
    members: Vec<TeamMember>,
}

impl Team {
    /// Creates a new Team aggregate
    ///
    /// # Returns
    /// * `Ok(Team)` - Validated team
    /// * `Err(DomainError::Validation)` - If the name or a member id is empty,
    ///   or a user id is listed twice
    pub fn new(team_name: impl Into<String>, members: Vec<TeamMember>) -> Result<Self, DomainError> {
        let team_name = team_name.into();
        ensure_identifier("team_name", &team_name)?;

        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            ensure_identifier("user_id", &member.user_id)?;
            if !seen.insert(member.user_id.as_str()) {
                return Err(DomainError::Validation(format!(
                    "user {} is listed more than once in team {}",
                    member.user_id, team_name
                )));
            }
        }

        Ok(Self { team_name, members })
    }

    /// Returns the team's unique name
    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    /// Returns the roster in stored order
    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    /// Looks up a member by user id
    pub fn member(&self, user_id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Iterates over members that may be picked as reviewers
    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.is_active)
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Only to be used by repository implementations.
    pub fn from_persistence(team_name: String, members: Vec<TeamMember>) -> Self {
        Self { team_name, members }
    }
}
