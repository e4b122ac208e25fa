// Infrastructure layer module
// Contains database adapters and the storage bootstrap
// Follows Hexagonal Architecture

pub mod database;
pub mod repositories;
