//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CatalogEntry, ErrorResponse, HealthResponse, MessageResponse, OptimizeRequest,
        OptimizeResponse, RecommendRequest, RecommendResponse,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pensum_core::{PlanOutcome, PlanRequest, PlannerError, eligible};
use std::sync::Arc;
use std::time::Instant;

/// Build a JSON error response.
fn error_response(status: StatusCode, kind: &str, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(kind, error))).into_response()
}

/// Map an engine error to a status code and error kind.
fn planner_error_response(error: &PlannerError) -> Response {
    match error {
        PlannerError::InvalidRequest(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", error.to_string())
        }
        PlannerError::Infeasible { .. } => {
            error_response(StatusCode::BAD_REQUEST, "infeasible", error.to_string())
        }
        PlannerError::SolveTimeout { .. } => {
            error_response(StatusCode::GATEWAY_TIMEOUT, "timeout", error.to_string())
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", error.to_string()),
    }
}

// =============================================================================
// SERVICE HANDLERS
// =============================================================================

/// Service banner.
pub async fn root_handler() -> impl IntoResponse {
    Json(MessageResponse::default())
}

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// CATALOG HANDLER
// =============================================================================

/// List every course ordered by level, then code.
pub async fn catalog_handler(State(state): State<AppState>) -> impl IntoResponse {
    let entries: Vec<CatalogEntry> = state
        .catalog
        .courses_by_level()
        .into_iter()
        .map(CatalogEntry::from)
        .collect();
    (StatusCode::OK, Json(entries))
}

// =============================================================================
// RECOMMEND HANDLER
// =============================================================================

/// Courses the student can take next term.
pub async fn recommend_handler(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return planner_error_response(&e);
    }

    let completed = request.completed_codes();
    let recommendation = eligible(&completed, &state.catalog);
    tracing::debug!(
        completed = completed.len(),
        eligible = recommendation.courses.len(),
        "Recommendation computed"
    );

    (
        StatusCode::OK,
        Json(RecommendResponse::from(&recommendation)),
    )
        .into_response()
}

// =============================================================================
// OPTIMIZE HANDLER
// =============================================================================

/// Compute a makespan-optimal plan for every remaining course.
///
/// The solve runs on the blocking pool and holds a solver permit for its
/// whole duration, so at most `solver_workers` solves run at once.
pub async fn optimize_handler(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return planner_error_response(&e);
    }

    let completed = request.completed_codes();
    let plan_request = PlanRequest {
        max_credits: request.max_credits.unwrap_or(state.settings.max_credits),
        flexible: request.flexible,
    };

    let Ok(permit) = Arc::clone(&state.solver_permits).acquire_owned().await else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Solver pool is closed",
        );
    };

    let catalog = Arc::clone(&state.catalog);
    let optimizer = Arc::clone(&state.optimizer);
    let started = Instant::now();
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        optimizer.plan_remaining(&completed, &catalog, &plan_request)
    })
    .await;
    let elapsed_ms = started.elapsed().as_millis();

    match joined {
        Ok(Ok(PlanOutcome::Planned(plan))) => {
            tracing::info!(
                level = plan.level,
                terms = plan.terms.len(),
                makespan = plan.makespan(),
                elapsed_ms,
                "Plan computed"
            );
            (StatusCode::OK, Json(OptimizeResponse::from(&plan))).into_response()
        }
        Ok(Ok(PlanOutcome::Infeasible)) => {
            tracing::warn!(
                max_credits = plan_request.max_credits,
                flexible = plan_request.flexible,
                elapsed_ms,
                "No feasible plan"
            );
            planner_error_response(&PlannerError::Infeasible {
                horizon: state.settings.horizon,
                max_credits: plan_request.max_credits,
            })
        }
        Ok(Ok(PlanOutcome::TimedOut)) => {
            tracing::warn!(elapsed_ms, "Solve limit reached");
            planner_error_response(&PlannerError::SolveTimeout {
                ms: state.settings.solve_timeout_ms,
            })
        }
        Ok(Err(e)) => {
            tracing::error!("Planning failed: {}", e);
            planner_error_response(&e)
        }
        Err(e) => {
            tracing::error!("Solver task failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Solver task failed",
            )
        }
    }
}
