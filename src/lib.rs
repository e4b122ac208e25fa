//! PR Reviewer API Library
//!
//! This library provides the core functionality for the PR reviewer
//! assignment service, including domain logic, the assignment engine,
//! repositories, and the HTTP adapter.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
