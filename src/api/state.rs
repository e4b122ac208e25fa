use std::sync::Arc;

use crate::services::AssignmentService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AssignmentService>,
    pub admin_token: Arc<str>,
}

impl AppState {
    pub fn new(service: AssignmentService, admin_token: impl Into<Arc<str>>) -> Self {
        Self {
            service: Arc::new(service),
            admin_token: admin_token.into(),
        }
    }
}
