//! # Runtime Configuration
//!
//! Planner settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config pensum.toml`)
//! 3. Environment variables
//!
//! ## Environment Variables
//!
//! - `PENSUM_HORIZON`: number of future terms considered (default: 12)
//! - `PENSUM_WINDOW`: progression window in levels (default: 2)
//! - `PENSUM_MAX_CREDITS`: default per-term credit cap (default: 17)
//! - `PENSUM_SOLVE_TIMEOUT_MS`: wall-clock bound per solve, 0 disables (default: 10000)
//! - `PENSUM_SOLVER_WORKERS`: concurrent solves (default: available parallelism)
//!
//! ## Example File
//!
//! ```toml
//! horizon = 12
//! window = 2
//! max_credits = 17
//! solve_timeout_ms = 10000
//! solver_workers = 4
//! ```

use pensum_core::primitives::{
    DEFAULT_HORIZON, DEFAULT_MAX_CREDITS, DEFAULT_SOLVE_TIMEOUT_MS, DEFAULT_WINDOW, MAX_HORIZON,
};
use pensum_core::{OptimizerConfig, PlannerError, SolveLimits};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest configuration file accepted (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Deployment-wide planner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerSettings {
    pub horizon: u32,
    pub window: u32,
    pub max_credits: u32,
    pub solve_timeout_ms: u64,
    pub solver_workers: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            window: DEFAULT_WINDOW,
            max_credits: DEFAULT_MAX_CREDITS,
            solve_timeout_ms: DEFAULT_SOLVE_TIMEOUT_MS,
            solver_workers: default_workers(),
        }
    }
}

impl PlannerSettings {
    /// Resolve settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, PlannerError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Read a TOML settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, PlannerError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PlannerError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PlannerError::IoError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, PlannerError> {
        toml::from_str(text).map_err(|e| PlannerError::DeserializationError(e.to_string()))
    }

    /// Override fields from `PENSUM_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_number("PENSUM_HORIZON") {
            self.horizon = v;
        }
        if let Some(v) = env_number("PENSUM_WINDOW") {
            self.window = v;
        }
        if let Some(v) = env_number("PENSUM_MAX_CREDITS") {
            self.max_credits = v;
        }
        if let Some(v) = env_number("PENSUM_SOLVE_TIMEOUT_MS") {
            self.solve_timeout_ms = v;
        }
        if let Some(v) = env_number("PENSUM_SOLVER_WORKERS") {
            self.solver_workers = v;
        }
    }

    /// Reject settings the planner cannot run with.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.horizon == 0 || self.horizon > MAX_HORIZON {
            return Err(PlannerError::InvalidRequest(format!(
                "horizon must be between 1 and {}, got {}",
                MAX_HORIZON, self.horizon
            )));
        }
        if self.max_credits == 0 {
            return Err(PlannerError::InvalidRequest(
                "max_credits must be at least 1".to_string(),
            ));
        }
        if self.solver_workers == 0 {
            return Err(PlannerError::InvalidRequest(
                "solver_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Solve budget derived from `solve_timeout_ms`; `0` means unbounded.
    #[must_use]
    pub fn solve_limits(&self) -> SolveLimits {
        match self.solve_timeout_ms {
            0 => SolveLimits::unlimited(),
            ms => SolveLimits::unlimited().with_time_limit(Duration::from_millis(ms)),
        }
    }

    /// Optimizer configuration for these settings.
    #[must_use]
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            horizon: self.horizon,
            window: self.window,
            limits: self.solve_limits(),
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
