//! # Core Type Definitions
//!
//! This module contains the core types for the Pensum planning engine:
//! - Course identity and attributes (`CourseCode`, `Course`)
//! - Student input (`completed_set`)
//! - Error types (`PlannerError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// COURSE CODE
// =============================================================================

/// Unique identifier of a course in the catalog (e.g. `MAT1031`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(pub String);

impl CourseCode {
    /// Create a course code, trimming surrounding whitespace.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_string())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the code is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Build a student's completed-course set from raw codes.
///
/// Codes are trimmed and blanks dropped. Codes that are not in any catalog
/// are kept: every consumer ignores them on lookup.
pub fn completed_set<I>(codes: I) -> BTreeSet<CourseCode>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    codes
        .into_iter()
        .map(CourseCode::new)
        .filter(|code| !code.is_empty())
        .collect()
}

// =============================================================================
// COURSE
// =============================================================================

/// A course of the curriculum.
///
/// Created once during catalog construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course code.
    pub code: CourseCode,
    /// Display name.
    pub name: String,
    /// Credit weight, always positive.
    pub credits: u32,
    /// Canonical term level. `0` means the course has no fixed term.
    pub level: u32,
    /// Minimum cumulative completed credits needed to attempt the course.
    pub min_credits: u32,
    /// Free-form classification (core, elective, ...).
    pub category: String,
}

impl Course {
    /// Create a course with no credit requirement and an empty category.
    #[must_use]
    pub fn new(code: impl Into<CourseCode>, name: impl Into<String>, credits: u32, level: u32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            credits,
            level,
            min_credits: 0,
            category: String::new(),
        }
    }

    /// Set the minimum cumulative credits requirement.
    #[must_use]
    pub fn with_min_credits(mut self, min_credits: u32) -> Self {
        self.min_credits = min_credits;
        self
    }

    /// Set the category tag.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// True when the course sits at a fixed canonical term (level > 0).
    #[must_use]
    pub const fn has_fixed_term(&self) -> bool {
        self.level > 0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Pensum system.
///
/// Catalog construction errors are fatal at startup. Plan outcomes such as
/// infeasibility are values (`PlanOutcome`); `Infeasible` and `SolveTimeout`
/// exist for callers that must surface them as failures.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Two catalog rows share a course code.
    #[error("Duplicate course code: {0}")]
    DuplicateCourse(CourseCode),

    /// The prerequisite relation contains a cycle through these courses.
    #[error("Prerequisite cycle involving: {}", format_codes(.0))]
    CyclicPrerequisites(Vec<CourseCode>),

    /// A catalog source row could not be parsed.
    #[error("Malformed catalog row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// A course failed validation.
    #[error("Invalid course {code}: {reason}")]
    InvalidCourse { code: CourseCode, reason: String },

    /// A planning request carried invalid parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No plan fits inside the horizon at this credit cap.
    #[error("No feasible plan within {horizon} terms at {max_credits} credits per term")]
    Infeasible { horizon: u32, max_credits: u32 },

    /// The solver ran out of budget before proving optimality.
    #[error("Solver did not finish within {ms} ms")]
    SolveTimeout { ms: u64 },

    /// A plan violates one of its invariants.
    #[error("Plan violation: {0}")]
    PlanViolation(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The mirror store failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

fn format_codes(codes: &[CourseCode]) -> String {
    codes
        .iter()
        .map(CourseCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// TESTS
// =============================================================================
