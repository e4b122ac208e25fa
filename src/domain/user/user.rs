use crate::domain::team::TeamMember;

/// A user and the single team they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl User {
    /// Projects the user onto their team roster entry
    pub fn as_member(&self) -> TeamMember {
        TeamMember::new(self.user_id.clone(), self.username.clone(), self.is_active)
    }
}
