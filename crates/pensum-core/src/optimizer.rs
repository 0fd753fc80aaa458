//! # Plan Optimizer
//!
//! Turns a student's situation into a `PlanProblem`, hands it to a
//! `TermSolver` and shapes the answer into a `Plan`.
//!
//! ## Formulation
//!
//! - One item per remaining course present in the catalog, in code order
//! - `term(p) < term(m)` for every prerequisite edge with both ends remaining
//! - Per-term credits at most the requested cap
//! - Progression window, unless the request is flexible: a course of level
//!   `L > 0` may sit in term `s` only if `L <= level + s + window`, where
//!   `level` is the student's progress level. Level-0 courses are exempt.
//! - Objective: minimize the last occupied term
//!
//! The horizon is fixed by configuration and never extended.

use crate::catalog::Catalog;
use crate::primitives::{DEFAULT_HORIZON, DEFAULT_MAX_CREDITS, DEFAULT_WINDOW};
use crate::progress::progress_level;
use crate::solver::{
    BranchAndBoundSolver, PlanItem, PlanProblem, SolveLimits, SolveOutcome, TermSolver,
};
use crate::{Course, CourseCode, PlannerError};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CONFIGURATION & REQUEST
// =============================================================================

/// Deployment-wide optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Number of future terms considered.
    pub horizon: u32,
    /// Progression window in canonical levels.
    pub window: u32,
    /// Budget for each solve.
    pub limits: SolveLimits,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            window: DEFAULT_WINDOW,
            limits: SolveLimits::unlimited(),
        }
    }
}

/// Per-request planning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRequest {
    /// Credit cap per term.
    pub max_credits: u32,
    /// Disable the progression window.
    pub flexible: bool,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            max_credits: DEFAULT_MAX_CREDITS,
            flexible: false,
        }
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// One occupied future term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTerm {
    /// 0-based index relative to the next term.
    pub index: u32,
    /// Sum of credits in this term.
    pub credits: u32,
    /// Courses ordered by canonical level, then code.
    pub courses: Vec<Course>,
}

/// An optimal assignment of remaining courses to future terms.
///
/// Only occupied terms are listed; their indices are preserved, so a plan
/// that has to wait for the progression window starts at a later index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Progress level the plan was computed from.
    pub level: u32,
    /// Occupied terms in ascending index order.
    pub terms: Vec<PlannedTerm>,
}

impl Plan {
    /// Index of the last occupied term, `0` for an empty plan.
    #[must_use]
    pub fn makespan(&self) -> u32 {
        self.terms.last().map(|t| t.index).unwrap_or(0)
    }

    /// Number of courses in the plan.
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.terms.iter().map(|t| t.courses.len()).sum()
    }

    /// Term index a course was placed in.
    #[must_use]
    pub fn term_of(&self, code: &CourseCode) -> Option<u32> {
        self.terms
            .iter()
            .find(|t| t.courses.iter().any(|c| &c.code == code))
            .map(|t| t.index)
    }

    /// Check the plan invariants independently of the solver.
    ///
    /// - every remaining catalog course appears exactly once, and nothing else
    /// - prerequisites (both ends remaining) sit in strictly earlier terms
    /// - no term exceeds `max_credits`
    pub fn verify(
        &self,
        catalog: &Catalog,
        remaining: &BTreeSet<CourseCode>,
        max_credits: u32,
    ) -> Result<(), PlannerError> {
        let mut placed: BTreeMap<&CourseCode, u32> = BTreeMap::new();
        for term in &self.terms {
            let mut credits = 0u32;
            for course in &term.courses {
                if placed.insert(&course.code, term.index).is_some() {
                    return Err(PlannerError::PlanViolation(format!(
                        "{} scheduled twice",
                        course.code
                    )));
                }
                credits = credits.saturating_add(course.credits);
            }
            if credits > max_credits {
                return Err(PlannerError::PlanViolation(format!(
                    "term {} carries {} credits, cap is {}",
                    term.index, credits, max_credits
                )));
            }
        }

        let expected: BTreeSet<&CourseCode> =
            remaining.iter().filter(|c| catalog.contains(c)).collect();
        let actual: BTreeSet<&CourseCode> = placed.keys().copied().collect();
        if expected != actual {
            return Err(PlannerError::PlanViolation(
                "plan does not cover exactly the remaining courses".to_string(),
            ));
        }

        for (code, &term) in &placed {
            for prereq in catalog.prerequisites_of(code) {
                if let Some(&before) = placed.get(prereq) {
                    if before >= term {
                        return Err(PlannerError::PlanViolation(format!(
                            "{} (term {}) is not before {} (term {})",
                            prereq, before, code, term
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// True when every fixed-term course respects the progression window.
    #[must_use]
    pub fn respects_window(&self, window: u32) -> bool {
        self.terms.iter().all(|term| {
            let limit = self.level.saturating_add(term.index).saturating_add(window);
            term.courses
                .iter()
                .all(|c| !c.has_fixed_term() || c.level <= limit)
        })
    }
}

/// Result of a planning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// An optimal plan.
    Planned(Plan),
    /// No plan fits inside the horizon.
    Infeasible,
    /// The solver ran out of budget before proving optimality.
    TimedOut,
}

impl PlanOutcome {
    /// The plan, if one was found.
    #[must_use]
    pub fn into_plan(self) -> Option<Plan> {
        match self {
            Self::Planned(plan) => Some(plan),
            Self::Infeasible | Self::TimedOut => None,
        }
    }
}

// =============================================================================
// OPTIMIZER
// =============================================================================

/// Stateless plan optimizer over a pluggable solver.
#[derive(Debug, Clone, Default)]
pub struct PlanOptimizer<S = BranchAndBoundSolver> {
    solver: S,
    config: OptimizerConfig,
}

impl PlanOptimizer<BranchAndBoundSolver> {
    /// Optimizer backed by the branch-and-bound solver.
    #[must_use]
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_solver(BranchAndBoundSolver::new(), config)
    }
}

impl<S: TermSolver> PlanOptimizer<S> {
    /// Optimizer backed by a custom solver.
    #[must_use]
    pub fn with_solver(solver: S, config: OptimizerConfig) -> Self {
        Self { solver, config }
    }

    /// The optimizer settings.
    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// The name of the underlying solver.
    #[must_use]
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// Build the solver-facing problem for a request.
    ///
    /// Remaining codes unknown to the catalog are skipped.
    pub fn formulate(
        &self,
        remaining: &BTreeSet<CourseCode>,
        completed: &BTreeSet<CourseCode>,
        catalog: &Catalog,
        request: &PlanRequest,
    ) -> Result<PlanProblem, PlannerError> {
        if request.max_credits == 0 {
            return Err(PlannerError::InvalidRequest(
                "max credits per term must be positive".to_string(),
            ));
        }
        if self.config.horizon == 0 {
            return Err(PlannerError::InvalidRequest(
                "planning horizon must be positive".to_string(),
            ));
        }

        let level = progress_level(completed, catalog);
        let courses: Vec<&Course> = remaining.iter().filter_map(|c| catalog.course(c)).collect();
        let index: BTreeMap<&CourseCode, usize> = courses
            .iter()
            .enumerate()
            .map(|(i, c)| (&c.code, i))
            .collect();

        let items = courses
            .iter()
            .map(|course| PlanItem {
                code: course.code.clone(),
                credits: course.credits,
                earliest: self.earliest_term(course, level, request.flexible),
            })
            .collect();

        let index = &index;
        let precedences = courses
            .iter()
            .enumerate()
            .flat_map(move |(after, course)| {
                catalog
                    .prerequisites_of(&course.code)
                    .filter_map(move |p| index.get(p).copied())
                    .map(move |before| (before, after))
            })
            .collect();

        Ok(PlanProblem {
            items,
            precedences,
            capacity: request.max_credits,
            horizon: self.config.horizon,
        })
    }

    /// First term a course may occupy under the progression window.
    fn earliest_term(&self, course: &Course, level: u32, flexible: bool) -> u32 {
        if flexible || !course.has_fixed_term() {
            return 0;
        }
        course
            .level
            .saturating_sub(level.saturating_add(self.config.window))
    }

    /// Compute an optimal plan for `remaining` given `completed`.
    pub fn optimize(
        &self,
        remaining: &BTreeSet<CourseCode>,
        completed: &BTreeSet<CourseCode>,
        catalog: &Catalog,
        request: &PlanRequest,
    ) -> Result<PlanOutcome, PlannerError> {
        let problem = self.formulate(remaining, completed, catalog, request)?;

        let assignment = match self.solver.solve(&problem, &self.config.limits) {
            SolveOutcome::Optimal(assignment) => assignment,
            SolveOutcome::Infeasible => return Ok(PlanOutcome::Infeasible),
            SolveOutcome::LimitReached => return Ok(PlanOutcome::TimedOut),
        };
        if !problem.is_satisfied_by(&assignment) {
            return Err(PlannerError::PlanViolation(format!(
                "{} returned an assignment that breaks the constraints",
                self.solver.name()
            )));
        }

        let mut grouped: BTreeMap<u32, Vec<Course>> = BTreeMap::new();
        for (item, &term) in problem.items.iter().zip(&assignment.terms) {
            if let Some(course) = catalog.course(&item.code) {
                grouped.entry(term).or_default().push(course.clone());
            }
        }

        let terms = grouped
            .into_iter()
            .map(|(index, mut courses)| {
                courses.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
                let credits = courses
                    .iter()
                    .fold(0u32, |acc, c| acc.saturating_add(c.credits));
                PlannedTerm {
                    index,
                    credits,
                    courses,
                }
            })
            .collect();

        Ok(PlanOutcome::Planned(Plan {
            level: progress_level(completed, catalog),
            terms,
        }))
    }

    /// Plan every catalog course the student has not completed.
    pub fn plan_remaining(
        &self,
        completed: &BTreeSet<CourseCode>,
        catalog: &Catalog,
        request: &PlanRequest,
    ) -> Result<PlanOutcome, PlannerError> {
        let remaining = catalog.remaining(completed);
        self.optimize(&remaining, completed, catalog, request)
    }
}

// =============================================================================
// TESTS
// =============================================================================
