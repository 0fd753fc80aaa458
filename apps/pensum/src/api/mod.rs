//! # Pensum HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `GET /catalog` - All courses, ordered by level then code
//! - `POST /recommend` - Courses eligible next term
//! - `POST /optimize` - Makespan-optimal multi-term plan
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `PENSUM_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `PENSUM_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `PENSUM_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use middleware::{DEFAULT_RATE_LIMIT, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CatalogEntry, CourseJson, ErrorResponse, HealthResponse, MessageResponse, OptimizeRequest,
    OptimizeResponse, RecommendRequest, RecommendResponse, RecommendedCourse, TermJson,
};

use crate::config::PlannerSettings;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use pensum_core::{Catalog, PlanOptimizer, PlannerError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    /// The curriculum, built once at startup.
    pub catalog: Arc<Catalog>,
    /// Optimizer configured from the settings.
    pub optimizer: Arc<PlanOptimizer>,
    /// Resolved runtime settings.
    pub settings: Arc<PlannerSettings>,
    /// One permit per concurrent solve.
    pub solver_permits: Arc<Semaphore>,
}

impl AppState {
    /// Create app state from a catalog and validated settings.
    #[must_use]
    pub fn new(catalog: Catalog, settings: PlannerSettings) -> Self {
        let optimizer = PlanOptimizer::new(settings.optimizer_config());
        let permits = settings.solver_workers.max(1);
        Self {
            catalog: Arc::new(catalog),
            optimizer: Arc::new(optimizer),
            settings: Arc::new(settings),
            solver_permits: Arc::new(Semaphore::new(permits)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `PENSUM_CORS_ORIGINS`.
///
/// `*` allows every origin, a comma-separated list allows those origins,
/// and anything else (unset, or no valid entry) falls back to localhost.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("PENSUM_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (PENSUM_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in PENSUM_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No PENSUM_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn build_localhost_cors() -> CorsLayer {
    let origins = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = create_rate_limiter(rate_limit);
    if rate_limiter.is_some() {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
    } else {
        tracing::info!("Rate limiting disabled");
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set PENSUM_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/catalog", get(handlers::catalog_handler))
        .route("/recommend", post(handlers::recommend_handler))
        .route("/optimize", post(handlers::optimize_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), PlannerError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PlannerError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Pensum HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PlannerError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
