//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use pensum_core::{
    Course, CourseCode, EligibleCourse, Plan, PlannedTerm, PlannerError, Recommendation,
    completed_set,
    primitives::{MAX_CODE_LENGTH, MAX_COMPLETED_CODES},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// SERVICE RESPONSES
// =============================================================================

/// Root banner response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl Default for MessageResponse {
    fn default() -> Self {
        Self {
            message: "Academic planning API running".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// One row of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    pub level: u32,
}

impl From<&Course> for CatalogEntry {
    fn from(course: &Course) -> Self {
        Self {
            code: course.code.to_string(),
            name: course.name.clone(),
            level: course.level,
        }
    }
}

/// Full course description used in recommendations and plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseJson {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub level: u32,
    pub category: String,
}

impl From<&Course> for CourseJson {
    fn from(course: &Course) -> Self {
        Self {
            code: course.code.to_string(),
            name: course.name.clone(),
            credits: course.credits,
            level: course.level,
            category: course.category.clone(),
        }
    }
}

// =============================================================================
// RECOMMEND REQUEST/RESPONSE
// =============================================================================

/// Check the completed list against the request size limit.
fn validate_completed(completed: &[String]) -> Result<(), PlannerError> {
    if completed.len() > MAX_COMPLETED_CODES {
        return Err(PlannerError::InvalidRequest(format!(
            "completed list has {} codes, maximum is {}",
            completed.len(),
            MAX_COMPLETED_CODES
        )));
    }
    Ok(())
}

/// Normalized completed set. Codes too long to name a course are dropped.
fn completed_codes(completed: &[String]) -> BTreeSet<CourseCode> {
    completed_set(
        completed
            .iter()
            .filter(|code| code.trim().len() <= MAX_CODE_LENGTH),
    )
}

/// Eligibility request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub completed: Vec<String>,
}

impl RecommendRequest {
    /// Validate request size before it reaches the engine.
    pub fn validate(&self) -> Result<(), PlannerError> {
        validate_completed(&self.completed)
    }

    /// Completed courses as catalog codes.
    pub fn completed_codes(&self) -> BTreeSet<CourseCode> {
        completed_codes(&self.completed)
    }
}

/// An eligible course with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedCourse {
    #[serde(flatten)]
    pub course: CourseJson,
    pub reason: String,
}

impl From<&EligibleCourse<'_>> for RecommendedCourse {
    fn from(entry: &EligibleCourse<'_>) -> Self {
        Self {
            course: CourseJson::from(entry.course),
            reason: entry.reason.to_string(),
        }
    }
}

/// Eligibility response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub total_credits: u32,
    pub courses: Vec<RecommendedCourse>,
}

impl From<&Recommendation<'_>> for RecommendResponse {
    fn from(rec: &Recommendation<'_>) -> Self {
        Self {
            total_credits: rec.total_credits,
            courses: rec.courses.iter().map(RecommendedCourse::from).collect(),
        }
    }
}

// =============================================================================
// OPTIMIZE REQUEST/RESPONSE
// =============================================================================

/// Plan request. `max_credits` falls back to the configured default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub max_credits: Option<u32>,
    #[serde(default)]
    pub flexible: bool,
}

impl OptimizeRequest {
    /// Validate request size and credit cap.
    pub fn validate(&self) -> Result<(), PlannerError> {
        validate_completed(&self.completed)?;
        if self.max_credits == Some(0) {
            return Err(PlannerError::InvalidRequest(
                "max_credits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Completed courses as catalog codes.
    pub fn completed_codes(&self) -> BTreeSet<CourseCode> {
        completed_codes(&self.completed)
    }
}

/// One term of a plan, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermJson {
    pub term: u32,
    pub credits: u32,
    pub courses: Vec<CourseJson>,
}

impl From<&PlannedTerm> for TermJson {
    fn from(term: &PlannedTerm) -> Self {
        Self {
            term: term.index.saturating_add(1),
            credits: term.credits,
            courses: term.courses.iter().map(CourseJson::from).collect(),
        }
    }
}

/// Successful plan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub success: bool,
    pub level: u32,
    pub plan: Vec<TermJson>,
}

impl From<&Plan> for OptimizeResponse {
    fn from(plan: &Plan) -> Self {
        Self {
            success: true,
            level: plan.level,
            plan: plan.terms.iter().map(TermJson::from).collect(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// `infeasible`, `invalid_request`, `timeout` or `internal`.
    pub kind: String,
    pub error: String,
}

impl ErrorResponse {
    /// Build an error body.
    pub fn new(kind: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            kind: kind.to_string(),
            error: error.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
