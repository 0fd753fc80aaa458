//! # Catalog Graph
//!
//! The curriculum as an immutable DAG of courses and prerequisite edges.
//!
//! A `Catalog` can only be obtained from `CatalogBuilder::build`, which
//! rejects duplicate codes and cycles. Once built it is read-only and meant
//! to be shared by reference (`Arc<Catalog>`) between concurrent requests.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::{Course, CourseCode, PlannerError};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// BUILDER
// =============================================================================

/// Accumulates courses and prerequisite edges before validation.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    courses: BTreeMap<CourseCode, Course>,
    /// dependent -> prerequisites
    prerequisites: BTreeMap<CourseCode, BTreeSet<CourseCode>>,
}

impl CatalogBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a course. Fails if the code is already present.
    pub fn add_course(&mut self, course: Course) -> Result<(), PlannerError> {
        if self.courses.contains_key(&course.code) {
            return Err(PlannerError::DuplicateCourse(course.code));
        }
        self.prerequisites.entry(course.code.clone()).or_default();
        self.courses.insert(course.code.clone(), course);
        Ok(())
    }

    /// Add a prerequisite edge `prerequisite -> dependent`.
    ///
    /// Both courses must already be present. Repeated edges are merged.
    pub fn add_prerequisite(
        &mut self,
        prerequisite: &CourseCode,
        dependent: &CourseCode,
    ) -> Result<(), PlannerError> {
        if !self.courses.contains_key(prerequisite) {
            return Err(PlannerError::InvalidCourse {
                code: dependent.clone(),
                reason: format!("unknown prerequisite {}", prerequisite),
            });
        }
        let Some(prereqs) = self.prerequisites.get_mut(dependent) else {
            return Err(PlannerError::InvalidCourse {
                code: dependent.clone(),
                reason: "prerequisite added before the course itself".to_string(),
            });
        };
        prereqs.insert(prerequisite.clone());
        Ok(())
    }

    /// Check whether a course code has been added.
    #[must_use]
    pub fn contains(&self, code: &CourseCode) -> bool {
        self.courses.contains_key(code)
    }

    /// Validate acyclicity and freeze the catalog.
    ///
    /// On a cycle, the error lists every course that could not be ordered:
    /// the courses on a cycle and those that depend on one.
    pub fn build(self) -> Result<Catalog, PlannerError> {
        let mut dependents: BTreeMap<CourseCode, BTreeSet<CourseCode>> = self
            .courses
            .keys()
            .map(|code| (code.clone(), BTreeSet::new()))
            .collect();
        let mut in_degree: BTreeMap<&CourseCode, usize> = BTreeMap::new();

        for (dependent, prereqs) in &self.prerequisites {
            in_degree.insert(dependent, prereqs.len());
            for prereq in prereqs {
                dependents
                    .entry(prereq.clone())
                    .or_default()
                    .insert(dependent.clone());
            }
        }

        // Kahn's algorithm; the ready set is ordered so the result is stable.
        let mut ready: BTreeSet<&CourseCode> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(code, _)| *code)
            .collect();
        let mut order = Vec::with_capacity(self.courses.len());

        while let Some(code) = ready.pop_first() {
            order.push(code.clone());
            for next in dependents.get(code).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() != self.courses.len() {
            let ordered: BTreeSet<&CourseCode> = order.iter().collect();
            let stuck = self
                .courses
                .keys()
                .filter(|code| !ordered.contains(code))
                .cloned()
                .collect();
            return Err(PlannerError::CyclicPrerequisites(stuck));
        }

        Ok(Catalog {
            courses: self.courses,
            prerequisites: self.prerequisites,
            dependents,
            topological_order: order,
        })
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// The validated, immutable curriculum graph.
#[derive(Debug, Clone)]
pub struct Catalog {
    courses: BTreeMap<CourseCode, Course>,
    /// dependent -> prerequisites (every course has an entry)
    prerequisites: BTreeMap<CourseCode, BTreeSet<CourseCode>>,
    /// prerequisite -> dependents (every course has an entry)
    dependents: BTreeMap<CourseCode, BTreeSet<CourseCode>>,
    /// Courses ordered so that every prerequisite precedes its dependents.
    topological_order: Vec<CourseCode>,
}

impl Catalog {
    /// Start building a catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Look up a course by code.
    #[must_use]
    pub fn course(&self, code: &CourseCode) -> Option<&Course> {
        self.courses.get(code)
    }

    /// Check whether the catalog contains a course.
    #[must_use]
    pub fn contains(&self, code: &CourseCode) -> bool {
        self.courses.contains_key(code)
    }

    /// All courses in code order.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    /// All course codes in code order.
    pub fn codes(&self) -> impl Iterator<Item = &CourseCode> {
        self.courses.keys()
    }

    /// Number of courses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// True when the catalog holds no course.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// All prerequisite edges as `(prerequisite, dependent)` in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = (&CourseCode, &CourseCode)> {
        self.dependents
            .iter()
            .flat_map(|(prereq, deps)| deps.iter().map(move |dep| (prereq, dep)))
    }

    /// Number of prerequisite edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.prerequisites.values().map(BTreeSet::len).sum()
    }

    /// Direct prerequisites of a course. Empty for unknown codes.
    pub fn prerequisites_of(&self, code: &CourseCode) -> impl Iterator<Item = &CourseCode> {
        self.prerequisites.get(code).into_iter().flatten()
    }

    /// Direct dependents of a course. Empty for unknown codes.
    pub fn dependents_of(&self, code: &CourseCode) -> impl Iterator<Item = &CourseCode> {
        self.dependents.get(code).into_iter().flatten()
    }

    /// Courses in an order where every prerequisite precedes its dependents.
    ///
    /// Ties are broken by code, so the order is stable across builds.
    #[must_use]
    pub fn topological_order(&self) -> &[CourseCode] {
        &self.topological_order
    }

    /// Courses ordered by canonical level, then code.
    #[must_use]
    pub fn courses_by_level(&self) -> Vec<&Course> {
        let mut list: Vec<&Course> = self.courses.values().collect();
        list.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
        list
    }

    /// Catalog courses not in `completed`.
    #[must_use]
    pub fn remaining(&self, completed: &BTreeSet<CourseCode>) -> BTreeSet<CourseCode> {
        self.courses
            .keys()
            .filter(|code| !completed.contains(*code))
            .cloned()
            .collect()
    }

    /// Sum of credits over completed codes present in the catalog.
    ///
    /// Unknown codes are ignored.
    #[must_use]
    pub fn credits_of(&self, completed: &BTreeSet<CourseCode>) -> u32 {
        completed
            .iter()
            .filter_map(|code| self.courses.get(code))
            .fold(0u32, |acc, course| acc.saturating_add(course.credits))
    }
}

// =============================================================================
// TESTS
// =============================================================================
