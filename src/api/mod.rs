// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use errors::ApiError;
use handlers::{health, pull_requests, stats, teams, users};
pub use state::AppState;

/// Builds the HTTP router with tracing, CORS and request timeout layers
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        // Health check
        .route("/health", get(health::health_check).fallback(method_not_allowed))
        // Team routes
        .route("/team/add", post(teams::create_team).fallback(method_not_allowed))
        .route("/team/get", get(teams::get_team).fallback(method_not_allowed))
        // Pull request routes
        .route(
            "/pullRequest/create",
            post(pull_requests::create_pull_request).fallback(method_not_allowed),
        )
        .route(
            "/pullRequest/merge",
            post(pull_requests::merge_pull_request).fallback(method_not_allowed),
        )
        .route(
            "/pullRequest/reassign",
            post(pull_requests::reassign_reviewer).fallback(method_not_allowed),
        )
        // User routes
        .route(
            "/users/setIsActive",
            post(users::set_is_active).fallback(method_not_allowed),
        )
        .route(
            "/users/getReview",
            get(users::get_review).fallback(method_not_allowed),
        )
        .route(
            "/users/bulkDeactivate",
            post(users::bulk_deactivate).fallback(method_not_allowed),
        )
        // Stats
        .route(
            "/stats/review-counts",
            get(stats::review_counts).fallback(method_not_allowed),
        )
        .fallback(not_found);

    // Middleware
    with_request_timeout(router, request_timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}

/// Bounds every request; an expired request is dropped and answered with
/// the usual error envelope
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("request timed out");
        ApiError::request_timeout()
    } else {
        ApiError::internal_server_error(format!("unhandled middleware error: {}", err))
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn not_found() -> ApiError {
    ApiError::not_found("resource not found")
}
