//! # pensum-core
//!
//! The deterministic planning engine for Pensum.
//!
//! This crate holds everything needed to answer the two questions a student
//! asks of a curriculum: which courses can I take next term, and what is the
//! shortest sequence of terms that finishes the rest.
//!
//! ## Architectural Constraints
//!
//! - The catalog is built once and immutable afterwards; every query reads it
//! - No async, no network, no floating-point arithmetic
//! - `BTreeMap`/`BTreeSet` everywhere, so identical inputs give identical output
//! - The solver sits behind the `TermSolver` trait and can be swapped

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod eligibility;
pub mod ingestor;
pub mod optimizer;
pub mod primitives;
pub mod progress;
pub mod solver;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Course, CourseCode, PlannerError, completed_set};

// =============================================================================
// RE-EXPORTS: Planning Engine
// =============================================================================

pub use catalog::{Catalog, CatalogBuilder};
pub use eligibility::{EligibleCourse, Recommendation, eligible, is_eligible};
pub use ingestor::{CatalogFormat, CourseRow, IngestReport, Ingestor, split_prerequisites};
pub use optimizer::{
    OptimizerConfig, Plan, PlanOptimizer, PlanOutcome, PlanRequest, PlannedTerm,
};
pub use progress::progress_level;
pub use solver::{
    Assignment, BranchAndBoundSolver, PlanItem, PlanProblem, SolveLimits, SolveOutcome,
    TermSolver,
};
pub use storage::{MirrorStats, RedbCatalog};
