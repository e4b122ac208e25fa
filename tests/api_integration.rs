//! End-to-end API integration tests
//!
//! These tests drive the complete HTTP router over the in-memory backend:
//! - Team creation and lookup
//! - Pull request creation, merge and reassignment
//! - Admin-only user endpoints and bulk deactivation
//! - Error envelopes for routing and body failures

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pr_reviewer_api::api::{self, AppState};
use pr_reviewer_api::infrastructure::repositories;
use pr_reviewer_api::services::AssignmentService;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::time::Duration;
use tower::util::ServiceExt; // for oneshot

const ADMIN_TOKEN: &str = "admin-token";

/// Setup test application over a fresh in-memory store
fn setup_app() -> Router {
    let service = AssignmentService::with_rng(repositories::in_memory(), StdRng::seed_from_u64(7));
    api::router(AppState::new(service, ADMIN_TOKEN), Duration::from_secs(5))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), None).await
}

async fn admin_post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body), Some(ADMIN_TOKEN)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

async fn create_team(app: &Router, team_name: &str, members: &[(&str, bool)]) -> (StatusCode, Value) {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, active)| json!({"user_id": id, "username": format!("{} name", id), "is_active": active}))
        .collect();
    post(app, "/team/add", json!({"team_name": team_name, "members": members})).await
}

async fn create_pr(app: &Router, id: &str, author: &str) -> (StatusCode, Value) {
    post(
        app,
        "/pullRequest/create",
        json!({"pull_request_id": id, "pull_request_name": format!("{} name", id), "author_id": author}),
    )
    .await
}

fn reviewers(pr: &Value) -> Vec<String> {
    pr["assigned_reviewers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

fn member_active(team: &Value, user_id: &str) -> bool {
    team["members"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["user_id"] == user_id)
        .unwrap()["is_active"]
        .as_bool()
        .unwrap()
}

#[tokio::test]
async fn test_full_review_flow() {
    let app = setup_app();

    let (status, body) = create_team(&app, "T", &[("U1", true), ("U2", true), ("U3", true)]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team"]["team_name"], "T");
    assert_eq!(body["team"]["members"].as_array().unwrap().len(), 3);

    let (status, body) = create_pr(&app, "P1", "U1").await;
    assert_eq!(status, StatusCode::CREATED);
    let assigned = reviewers(&body["pr"]);
    assert_eq!(assigned.len(), 2);
    assert_ne!(assigned[0], assigned[1]);
    assert!(assigned.iter().all(|r| r == "U2" || r == "U3"));
    assert_eq!(body["pr"]["status"], "OPEN");
    assert!(body["pr"].get("createdAt").is_some());
    assert!(body["pr"].get("mergedAt").is_none());

    let (status, body) = get(&app, "/users/getReview?user_id=U2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "U2");
    assert!(body["pull_requests"]
        .as_array()
        .unwrap()
        .iter()
        .any(|pr| pr["pull_request_id"] == "P1"));

    let (status, first) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "P1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "MERGED");
    assert!(first["pr"]["mergedAt"].is_string());

    let (status, second) = post(&app, "/pullRequest/merge", json!({"pull_request_id": "P1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["pr"]["status"], "MERGED");
    assert_eq!(second["pr"]["mergedAt"], first["pr"]["mergedAt"]);

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "P1", "old_user_id": "U2"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_MERGED");
}

#[tokio::test]
async fn test_bulk_deactivate_after_merge() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true), ("U3", true)]).await;
    create_pr(&app, "P1", "U1").await;
    post(&app, "/pullRequest/merge", json!({"pull_request_id": "P1"})).await;

    let (status, body) = admin_post(&app, "/users/bulkDeactivate", json!({"user_ids": ["U2", "U3"]})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Users deactivated successfully");
    assert_eq!(body["deactivated_users"], json!(["U2", "U3"]));

    let (status, team) = get(&app, "/team/get?team_name=T").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!member_active(&team, "U2"));
    assert!(!member_active(&team, "U3"));
    assert!(member_active(&team, "U1"));
}

#[tokio::test]
async fn test_bulk_deactivate_hands_open_reviews_to_teammates() {
    let app = setup_app();
    create_team(
        &app,
        "T",
        &[("U1", true), ("U2", true), ("U3", true), ("U4", true), ("U5", true)],
    )
    .await;
    create_pr(&app, "P1", "U1").await;
    post(&app, "/pullRequest/merge", json!({"pull_request_id": "P1"})).await;
    create_pr(&app, "P2", "U1").await;

    let (status, body) = admin_post(&app, "/users/bulkDeactivate", json!({"user_ids": ["U2", "U3"]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deactivated_users"], json!(["U2", "U3"]));

    let (_, team) = get(&app, "/team/get?team_name=T").await;
    assert!(!member_active(&team, "U2"));
    assert!(!member_active(&team, "U3"));

    // P2 kept two reviewers, both still active
    let (_, stats) = get(&app, "/stats/review-counts").await;
    let open_load: i64 = stats["stats"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["user_id"] == "U4" || s["user_id"] == "U5")
        .map(|s| s["review_count"].as_i64().unwrap())
        .sum();
    assert_eq!(open_load, 2);
    for user_id in ["U2", "U3"] {
        let (_, queue) = get(&app, &format!("/users/getReview?user_id={}", user_id)).await;
        assert!(queue["pull_requests"]
            .as_array()
            .unwrap()
            .iter()
            .all(|pr| pr["status"] == "MERGED"));
    }
}

#[tokio::test]
async fn test_bulk_deactivate_of_every_eligible_reviewer_is_rejected() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true), ("U3", true)]).await;
    create_pr(&app, "P2", "U1").await;

    let (status, body) = admin_post(&app, "/users/bulkDeactivate", json!({"user_ids": ["U2", "U3"]})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "BULK_DEACTIVATE_FAILED");
    let (_, team) = get(&app, "/team/get?team_name=T").await;
    assert!(member_active(&team, "U2"));
    assert!(member_active(&team, "U3"));
}

#[tokio::test]
async fn test_bulk_deactivate_infeasible() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true)]).await;
    let (_, body) = create_pr(&app, "P1", "U1").await;
    assert_eq!(reviewers(&body["pr"]), vec!["U2".to_string()]);

    let (status, body) = admin_post(&app, "/users/bulkDeactivate", json!({"user_ids": ["U2"]})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "BULK_DEACTIVATE_FAILED");
    let (_, team) = get(&app, "/team/get?team_name=T").await;
    assert!(member_active(&team, "U2"));
}

#[tokio::test]
async fn test_reassign_not_assigned() {
    let app = setup_app();
    // U4 is inactive at creation, so the reviewers are exactly U2 and U3
    create_team(&app, "T", &[("U1", true), ("U2", true), ("U3", true), ("U4", false)]).await;
    let (_, body) = create_pr(&app, "P", "U1").await;
    let mut assigned = reviewers(&body["pr"]);
    assigned.sort();
    assert_eq!(assigned, vec!["U2".to_string(), "U3".to_string()]);

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "P", "old_user_id": "U4"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NOT_ASSIGNED");
}

#[tokio::test]
async fn test_reassign_picks_remaining_teammate() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true), ("U3", true), ("U4", true)]).await;
    let (_, body) = create_pr(&app, "P", "U1").await;
    let before = reviewers(&body["pr"]);
    let spare = ["U2", "U3", "U4"]
        .into_iter()
        .find(|id| !before.iter().any(|r| r == id))
        .unwrap();

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": "P", "old_user_id": before[0]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replaced_by"], spare);
    let after = reviewers(&body["pr"]);
    assert_eq!(after, vec![spare.to_string(), before[1].clone()]);
}

#[tokio::test]
async fn test_create_duplicate_team() {
    let app = setup_app();

    let (status, _) = create_team(&app, "backend", &[("U1", true)]).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_team(&app, "backend", &[("U1", true)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "TEAM_EXISTS");
}

#[tokio::test]
async fn test_create_pr_unknown_author() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true)]).await;

    let (status, body) = create_pr(&app, "P1", "ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_create_duplicate_pr() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true)]).await;

    let (status, _) = create_pr(&app, "P1", "U1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_pr(&app, "P1", "U1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_EXISTS");
}

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true)]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/setIsActive",
        Some(json!({"user_id": "U1", "is_active": false})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        Method::POST,
        "/users/bulkDeactivate",
        Some(json!({"user_ids": ["U1"]})),
        Some("Bearer admin-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = admin_post(&app, "/users/setIsActive", json!({"user_id": "U1", "is_active": false})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], "U1");
    assert_eq!(body["user"]["team_name"], "T");
    assert_eq!(body["user"]["is_active"], false);
}

#[tokio::test]
async fn test_get_review_requires_user_id() {
    let app = setup_app();

    let (status, body) = get(&app, "/users/getReview").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_unknown_team() {
    let app = setup_app();

    let (status, body) = get(&app, "/team/get?team_name=nobody").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/team/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "invalid JSON");
}

#[tokio::test]
async fn test_wrong_method_and_unknown_path() {
    let app = setup_app();

    let (status, body) = get(&app, "/team/add").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_code(&body), "METHOD_NOT_ALLOWED");

    let (status, body) = get(&app, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_stats_and_health() {
    let app = setup_app();
    create_team(&app, "T", &[("U1", true), ("U2", true)]).await;
    create_pr(&app, "P1", "U1").await;

    let (status, body) = get(&app, "/stats/review-counts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["stats"],
        json!([
            {"user_id": "U2", "username": "U2 name", "review_count": 1},
            {"user_id": "U1", "username": "U1 name", "review_count": 0},
        ])
    );

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
