//! # Eligibility Engine
//!
//! Filters the courses a student has not completed down to those they can
//! take next term: every prerequisite completed and enough cumulative
//! credits. Pure and read-only.

use crate::catalog::Catalog;
use crate::primitives::ELIGIBILITY_REASON;
use crate::{Course, CourseCode};
use std::collections::BTreeSet;

/// A course the student may take now, with the justification shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleCourse<'a> {
    pub course: &'a Course,
    pub reason: &'static str,
}

/// Result of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation<'a> {
    /// Credits over completed codes present in the catalog.
    pub total_credits: u32,
    /// Eligible courses ordered by canonical level, then code.
    pub courses: Vec<EligibleCourse<'a>>,
}

/// Check a single course against a completed set and credit total.
#[must_use]
pub fn is_eligible(
    course: &Course,
    completed: &BTreeSet<CourseCode>,
    total_credits: u32,
    catalog: &Catalog,
) -> bool {
    !completed.contains(&course.code)
        && catalog
            .prerequisites_of(&course.code)
            .all(|prereq| completed.contains(prereq))
        && total_credits >= course.min_credits
}

/// List every course the student can take next.
///
/// Completed codes unknown to the catalog are ignored when summing credits.
#[must_use]
pub fn eligible<'a>(completed: &BTreeSet<CourseCode>, catalog: &'a Catalog) -> Recommendation<'a> {
    let total_credits = catalog.credits_of(completed);

    let courses = catalog
        .courses_by_level()
        .into_iter()
        .filter(|course| is_eligible(course, completed, total_credits, catalog))
        .map(|course| EligibleCourse {
            course,
            reason: ELIGIBILITY_REASON,
        })
        .collect();

    Recommendation {
        total_credits,
        courses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut builder = Catalog::builder();
        builder.add_course(Course::new("X1", "Intro", 3, 1)).expect("add");
        builder.add_course(Course::new("X2", "Next", 3, 2)).expect("add");
        builder
            .add_course(Course::new("SEM", "Seminar", 2, 1).with_min_credits(6))
            .expect("add");
        builder.add_course(Course::new("FREE", "Free", 2, 0)).expect("add");
        builder
            .add_prerequisite(&CourseCode::new("X1"), &CourseCode::new("X2"))
            .expect("edge");
        builder.build().expect("build")
    }

    fn codes(rec: &Recommendation<'_>) -> Vec<String> {
        rec.courses.iter().map(|c| c.course.code.0.clone()).collect()
    }

    #[test]
    fn fresh_student_gets_roots_sorted_by_level() {
        let catalog = catalog();
        let rec = eligible(&BTreeSet::new(), &catalog);
        assert_eq!(rec.total_credits, 0);
        assert_eq!(codes(&rec), vec!["FREE", "X1"]);
        assert!(rec.courses.iter().all(|c| c.reason == ELIGIBILITY_REASON));
    }

    #[test]
    fn credit_requirement_unlocks() {
        let catalog = catalog();
        let completed = crate::completed_set(["X1", "FREE", "GHOST"]);
        let rec = eligible(&completed, &catalog);
        assert_eq!(rec.total_credits, 5);
        assert_eq!(codes(&rec), vec!["X2"]);

        let completed = crate::completed_set(["X1", "FREE", "X2"]);
        let rec = eligible(&completed, &catalog);
        assert_eq!(rec.total_credits, 8);
        assert_eq!(codes(&rec), vec!["SEM"]);
    }
}
