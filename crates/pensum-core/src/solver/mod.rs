//! # Term Solver
//!
//! The constraint-solving capability behind the plan optimizer.
//!
//! A `PlanProblem` is the solver-facing formulation of a planning request:
//! one item per course to schedule, each with an allowed term range
//! `[earliest, horizon)`, strict precedence pairs between items, and a
//! per-term credit capacity. A `TermSolver` returns an assignment that
//! minimizes the makespan (the last occupied term), proves there is none,
//! or reports that its limits ran out first.
//!
//! Any exact method fits behind the trait. `BranchAndBoundSolver` is the
//! one shipped with the crate.

mod branch_bound;

pub use branch_bound::BranchAndBoundSolver;

use crate::CourseCode;
use std::time::Duration;

// =============================================================================
// FORMULATION
// =============================================================================

/// One course to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub code: CourseCode,
    pub credits: u32,
    /// First term the item may occupy (progression window lower bound).
    pub earliest: u32,
}

/// A complete scheduling problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanProblem {
    /// Items in a fixed order; assignments are index-aligned with it.
    pub items: Vec<PlanItem>,
    /// `(before, after)` item indices: `term(before) < term(after)`.
    pub precedences: Vec<(usize, usize)>,
    /// Maximum credits per term.
    pub capacity: u32,
    /// Number of available terms; valid terms are `0..horizon`.
    pub horizon: u32,
}

impl PlanProblem {
    /// Sum of all item credits.
    #[must_use]
    pub fn total_credits(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.credits)).sum()
    }

    /// Check an assignment against every constraint of the problem.
    #[must_use]
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        if assignment.terms.len() != self.items.len() {
            return false;
        }
        let in_range = self
            .items
            .iter()
            .zip(&assignment.terms)
            .all(|(item, &term)| term >= item.earliest && term < self.horizon);
        let ordered = self
            .precedences
            .iter()
            .all(|&(before, after)| {
                match (assignment.terms.get(before), assignment.terms.get(after)) {
                    (Some(b), Some(a)) => b < a,
                    _ => false,
                }
            });
        let mut load = vec![0u64; self.horizon as usize];
        for (item, &term) in self.items.iter().zip(&assignment.terms) {
            if let Some(slot) = load.get_mut(term as usize) {
                *slot += u64::from(item.credits);
            }
        }
        let capped = load.iter().all(|&credits| credits <= u64::from(self.capacity));
        in_range && ordered && capped
    }
}

/// Term index per item, aligned with `PlanProblem::items`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    pub terms: Vec<u32>,
}

impl Assignment {
    /// The last occupied term, `0` for an empty assignment.
    #[must_use]
    pub fn makespan(&self) -> u32 {
        self.terms.iter().copied().max().unwrap_or(0)
    }
}

// =============================================================================
// OUTCOME & LIMITS
// =============================================================================

/// What a solver produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A makespan-minimal assignment.
    Optimal(Assignment),
    /// No assignment satisfies the constraints within the horizon.
    Infeasible,
    /// Time or node budget ran out before the search finished.
    LimitReached,
}

/// Budget for a single solve. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveLimits {
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
}

impl SolveLimits {
    /// No limits at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
        }
    }

    /// Bound the wall-clock time of the solve.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Bound the number of search nodes explored.
    #[must_use]
    pub const fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

// =============================================================================
// SOLVER TRAIT
// =============================================================================

/// A pluggable exact solver for `PlanProblem`s.
///
/// Implementations must be deterministic: the same problem and limits that
/// do not run out must always produce the same outcome.
pub trait TermSolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Solve the problem within the given limits.
    fn solve(&self, problem: &PlanProblem, limits: &SolveLimits) -> SolveOutcome;
}
