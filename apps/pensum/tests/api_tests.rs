//! Integration tests for the Pensum HTTP API.
//!
//! Uses axum-test to exercise the router without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - env-dependent tests are serialized
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use pensum::api::{
    AppState, CatalogEntry, ErrorResponse, HealthResponse, MessageResponse, OptimizeResponse,
    RecommendResponse, create_router,
};
use pensum::config::PlannerSettings;
use pensum_core::{
    Catalog, CatalogFormat, Ingestor, OptimizerConfig, PlanOptimizer, SolveLimits,
};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};

/// Serializes tests because the router reads `PENSUM_*` variables.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

const CATALOG_CSV: &str = "code,name,credits,level,min_credits,category,prerequisites\n\
    X1,Intro,3,1,0,core,\n\
    X2,Next,3,2,0,core,X1\n\
    LANG,English,2,0,0,elective,\n\
    FAR,Advanced Seminar,3,6,0,elective,\n";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and clears the API key on drop.
struct TestGuard {
    _guard: MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("PENSUM_API_KEY") };
    }
}

fn lock_env(api_key: Option<&str>) -> TestGuard {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe {
        std::env::set_var("PENSUM_RATE_LIMIT", "0");
        match api_key {
            Some(key) => std::env::set_var("PENSUM_API_KEY", key),
            None => std::env::remove_var("PENSUM_API_KEY"),
        }
    }
    TestGuard { _guard: guard }
}

fn catalog() -> Catalog {
    Ingestor::load(CATALOG_CSV.as_bytes(), CatalogFormat::Csv)
        .unwrap()
        .0
}

fn test_state() -> AppState {
    let settings = PlannerSettings {
        solver_workers: 2,
        ..PlannerSettings::default()
    };
    AppState::new(catalog(), settings)
}

fn create_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env(None);
    let server = TestServer::new(create_router(test_state())).unwrap();
    (server, guard)
}

fn codes(term: &pensum::api::TermJson) -> Vec<&str> {
    term.courses.iter().map(|c| c.code.as_str()).collect()
}

// =============================================================================
// SERVICE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let (server, _guard) = create_test_server();

    let response = server.get("/").await;

    response.assert_status_ok();
    let body: MessageResponse = response.json();
    assert_eq!(body.message, "Academic planning API running");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let (server, _guard) = create_test_server();
    server.get("/nope").await.assert_status_not_found();
}

// =============================================================================
// CATALOG ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_catalog_sorted_by_level_then_code() {
    let (server, _guard) = create_test_server();

    let response = server.get("/catalog").await;

    response.assert_status_ok();
    let entries: Vec<CatalogEntry> = response.json();
    let order: Vec<(&str, u32)> = entries.iter().map(|e| (e.code.as_str(), e.level)).collect();
    assert_eq!(order, vec![("LANG", 0), ("X1", 1), ("X2", 2), ("FAR", 6)]);
}

// =============================================================================
// RECOMMEND ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_recommend_fresh_student() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({ "completed": [] }))
        .await;

    response.assert_status_ok();
    let body: RecommendResponse = response.json();
    assert_eq!(body.total_credits, 0);
    let listed: Vec<&str> = body.courses.iter().map(|c| c.course.code.as_str()).collect();
    assert_eq!(listed, vec!["LANG", "X1", "FAR"]);
    assert!(
        body.courses
            .iter()
            .all(|c| c.reason == "Meets prerequisites and credit requirement")
    );
}

#[tokio::test]
async fn test_recommend_after_prerequisite() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({ "completed": ["X1", "GHOST", "  "] }))
        .await;

    response.assert_status_ok();
    let body: RecommendResponse = response.json();
    assert_eq!(body.total_credits, 3);
    assert!(body.courses.iter().any(|c| c.course.code == "X2"));
    assert!(!body.courses.iter().any(|c| c.course.code == "X1"));
}

#[tokio::test]
async fn test_optimize_ignores_overlong_completed_code() {
    let (server, _guard) = create_test_server();
    let overlong = "X1".repeat(40);

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": ["X1", overlong] }))
        .await;

    response.assert_status_ok();
    let body: OptimizeResponse = response.json();
    assert!(body.plan.iter().all(|t| !codes(t).contains(&"X1")));
}

#[tokio::test]
async fn test_recommend_malformed_body_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({ "completed": "X1" }))
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// OPTIMIZE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_optimize_default_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": [] }))
        .await;

    response.assert_status_ok();
    let body: OptimizeResponse = response.json();
    assert!(body.success);
    assert_eq!(body.level, 1);

    let first = &body.plan[0];
    assert_eq!(first.term, 1);
    assert!(codes(first).contains(&"X1"));
    assert!(codes(first).contains(&"LANG"));
    assert!(!codes(first).contains(&"FAR"));

    let x2_term = body
        .plan
        .iter()
        .find(|t| codes(t).contains(&"X2"))
        .map(|t| t.term)
        .unwrap();
    assert!(x2_term > 1);
}

#[tokio::test]
async fn test_optimize_flexible_allows_far_course_first() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": ["X1"], "flexible": true }))
        .await;

    response.assert_status_ok();
    let body: OptimizeResponse = response.json();
    assert_eq!(body.plan.len(), 1);
    assert_eq!(body.plan[0].term, 1);
    assert_eq!(codes(&body.plan[0]), vec!["LANG", "X2", "FAR"]);
}

#[tokio::test]
async fn test_optimize_everything_done() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": ["X1", "X2", "LANG", "FAR"] }))
        .await;

    response.assert_status_ok();
    let body: OptimizeResponse = response.json();
    assert!(body.plan.is_empty());
    assert_eq!(body.level, 10);
}

#[tokio::test]
async fn test_optimize_infeasible_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": [], "max_credits": 2 }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(!body.success);
    assert_eq!(body.kind, "infeasible");
    assert!(body.error.contains("at 2 credits per term"));
}

#[tokio::test]
async fn test_optimize_zero_cap_is_invalid() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": [], "max_credits": 0 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "invalid_request");
}

#[tokio::test]
async fn test_optimize_limit_reached_is_timeout() {
    let guard = lock_env(None);
    let mut state = test_state();
    state.optimizer = Arc::new(PlanOptimizer::new(OptimizerConfig {
        limits: SolveLimits::unlimited().with_node_limit(1),
        ..OptimizerConfig::default()
    }));
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/optimize")
        .json(&json!({ "completed": [] }))
        .await;
    drop(guard);

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "timeout");
}

#[tokio::test]
async fn test_optimize_is_deterministic() {
    let (server, _guard) = create_test_server();
    let request = json!({ "completed": ["LANG"], "max_credits": 6 });

    let first: OptimizeResponse = server.post("/optimize").json(&request).await.json();
    let second: OptimizeResponse = server.post("/optimize").json(&request).await.json();

    assert_eq!(first.plan, second.plan);
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = lock_env(Some("test-secret-key"));
    let server = TestServer::new(create_router(test_state())).unwrap();

    server.get("/catalog").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key";
    let _guard = lock_env(Some(api_key));
    let server = TestServer::new(create_router(test_state())).unwrap();

    let response = server
        .get("/catalog")
        .add_header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key).parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_wrong_key_rejected() {
    let _guard = lock_env(Some("test-secret-key"));
    let server = TestServer::new(create_router(test_state())).unwrap();

    let response = server
        .post("/optimize")
        .add_header(
            header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .json(&json!({ "completed": [] }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_health_is_public() {
    let _guard = lock_env(Some("test-secret-key"));
    let server = TestServer::new(create_router(test_state())).unwrap();

    server.get("/health").await.assert_status_ok();
}
