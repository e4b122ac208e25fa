// Pull request domain module
// Contains the pull request aggregate, its lifecycle status and read models

#![allow(clippy::module_inception)]

pub mod pull_request;
pub mod value_objects;

pub use pull_request::{PullRequest, PullRequestShort, MAX_REVIEWERS};
pub use value_objects::PullRequestStatus;
