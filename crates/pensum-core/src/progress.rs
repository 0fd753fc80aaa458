//! # Progress Level
//!
//! A student's effective standing is the lowest canonical level among the
//! fixed-term courses they still owe. Credits earned laterally (electives,
//! courses taken ahead) do not move it.

use crate::catalog::Catalog;
use crate::primitives::FINAL_STANDING_LEVEL;
use crate::CourseCode;
use std::collections::BTreeSet;

/// Compute the student's progress level.
///
/// Courses with level 0 never determine standing. When no fixed-term course
/// remains, returns `FINAL_STANDING_LEVEL`.
#[must_use]
pub fn progress_level(completed: &BTreeSet<CourseCode>, catalog: &Catalog) -> u32 {
    catalog
        .courses()
        .filter(|course| !completed.contains(&course.code))
        .filter(|course| course.has_fixed_term())
        .map(|course| course.level)
        .min()
        .unwrap_or(FINAL_STANDING_LEVEL)
}
