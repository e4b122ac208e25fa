// Application services
// Orchestrate repository ports to carry out reviewer assignment workflows

pub mod assignment;
pub mod selection;

pub use assignment::{AssignmentService, Reassignment};
