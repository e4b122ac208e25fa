use serde::Serialize;

/// Number of open pull requests a user is currently reviewing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStat {
    pub user_id: String,
    pub username: String,
    pub review_count: i64,
}
