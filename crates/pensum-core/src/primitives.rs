//! # Planning Primitives
//!
//! Hardcoded defaults and limits for the Pensum CORE.
//!
//! The catalog starts empty but the planning rules are fixed.
//! Defaults here can be overridden per deployment through configuration;
//! limits cannot.

/// Default number of future terms the optimizer considers.
///
/// The horizon is never extended automatically: a plan that does not fit
/// inside it is reported as infeasible.
pub const DEFAULT_HORIZON: u32 = 12;

/// Default progression window.
///
/// A course with canonical level `L > 0` may be taken in relative term `s`
/// only if `L <= level + s + DEFAULT_WINDOW`.
pub const DEFAULT_WINDOW: u32 = 2;

/// Standing reported when a student owes no course with a fixed term.
///
/// Matches the ten-term curriculum the levels are drawn from. It means
/// "effectively graduating", not an upper bound on levels.
pub const FINAL_STANDING_LEVEL: u32 = 10;

/// Default credit cap per term for plan requests.
pub const DEFAULT_MAX_CREDITS: u32 = 17;

/// Default wall-clock budget for a single solve, in milliseconds.
pub const DEFAULT_SOLVE_TIMEOUT_MS: u64 = 10_000;

/// The solver checks its limits once every this many search nodes.
pub const LIMIT_CHECK_INTERVAL: u64 = 1024;

/// Justification attached to every eligible course.
pub const ELIGIBILITY_REASON: &str = "Meets prerequisites and credit requirement";

/// Delimiter between prerequisite codes inside a catalog row.
pub const PREREQUISITE_DELIMITER: char = ';';

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for a course code.
///
/// Codes longer than this are rejected by the Ingestor.
pub const MAX_CODE_LENGTH: usize = 32;

/// Maximum length for a course name or category.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum number of rows in a catalog source.
pub const MAX_CATALOG_ROWS: usize = 10_000;

/// Maximum number of completed codes accepted in a single request.
pub const MAX_COMPLETED_CODES: usize = 10_000;

/// Maximum horizon accepted by configuration.
///
/// Keeps a single solve computationally bounded.
pub const MAX_HORIZON: u32 = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_standing_below_default_horizon() {
        assert!(FINAL_STANDING_LEVEL < DEFAULT_HORIZON);
    }

    #[test]
    fn default_horizon_within_limit() {
        assert!(DEFAULT_HORIZON <= MAX_HORIZON);
    }
}
