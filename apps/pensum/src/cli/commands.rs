//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use pensum::api::{self, AppState, CatalogEntry, OptimizeResponse, RecommendResponse};
use pensum::config::PlannerSettings;
use pensum_core::{
    Catalog, CatalogFormat, IngestReport, Ingestor, Plan, PlanOptimizer, PlanOutcome, PlanRequest,
    PlannerError, RedbCatalog, completed_set, eligible, progress_level,
};
use std::path::{Path, PathBuf};

// =============================================================================
// CATALOG LOADING
// =============================================================================

/// Maximum catalog file size (16 MB).
const MAX_CATALOG_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Where the catalog comes from.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub path: PathBuf,
    /// Explicit format; guessed from the extension when `None`.
    pub format: Option<String>,
}

impl CatalogSource {
    fn format(&self) -> Result<CatalogFormat, PlannerError> {
        match &self.format {
            Some(name) => name.parse(),
            None => Ok(CatalogFormat::from_path(&self.path)),
        }
    }
}

/// Canonicalize the path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PlannerError> {
    let canonical = path.canonicalize().map_err(|e| {
        PlannerError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(PlannerError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Read, parse and build the catalog. Skipped prerequisites are logged.
pub fn load_catalog(source: &CatalogSource) -> Result<(Catalog, IngestReport), PlannerError> {
    let path = validate_file_path(&source.path)?;
    let metadata = std::fs::metadata(&path)
        .map_err(|e| PlannerError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_CATALOG_FILE_SIZE {
        return Err(PlannerError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CATALOG_FILE_SIZE
        )));
    }

    let bytes = std::fs::read(&path)
        .map_err(|e| PlannerError::IoError(format!("Read file: {}", e)))?;
    let (catalog, report) = Ingestor::load(&bytes, source.format()?)?;

    for (dependent, missing) in &report.skipped_prerequisites {
        tracing::warn!(
            course = %dependent,
            prerequisite = %missing,
            "Skipping prerequisite that is not in the catalog"
        );
    }
    tracing::info!(
        "Loaded {} courses and {} prerequisites from {:?}",
        report.courses,
        report.edges,
        source.path
    );
    Ok((catalog, report))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), PlannerError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PlannerError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    source: &CatalogSource,
    config: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<(), PlannerError> {
    let settings = PlannerSettings::load(config)?;
    let (catalog, report) = load_catalog(source)?;

    println!("Pensum Planning Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:          {}", host);
    println!("  Port:          {}", port);
    println!("  Catalog:       {:?} ({} courses)", source.path, report.courses);
    println!("  Horizon:       {} terms", settings.horizon);
    println!("  Window:        {} levels", settings.window);
    println!("  Max credits:   {}", settings.max_credits);
    println!("  Solve timeout: {} ms", settings.solve_timeout_ms);
    println!("  Solvers:       {}", settings.solver_workers);
    println!();
    println!("Endpoints:");
    println!("  GET  /          - Service banner");
    println!("  GET  /health    - Health check");
    println!("  GET  /catalog   - List courses");
    println!("  POST /recommend - Eligible courses");
    println!("  POST /optimize  - Optimal plan");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, AppState::new(catalog, settings)).await
}

// =============================================================================
// CATALOG COMMAND
// =============================================================================

/// List the catalog.
pub fn cmd_catalog(source: &CatalogSource, json_mode: bool) -> Result<(), PlannerError> {
    let (catalog, _) = load_catalog(source)?;
    let courses = catalog.courses_by_level();

    if json_mode {
        let entries: Vec<CatalogEntry> = courses.into_iter().map(CatalogEntry::from).collect();
        return print_json(&entries);
    }

    println!("{:<5} {:<12} {:>7}  Name", "Level", "Code", "Credits");
    for course in courses {
        println!(
            "{:<5} {:<12} {:>7}  {}",
            course.level, course.code, course.credits, course.name
        );
    }
    Ok(())
}

// =============================================================================
// RECOMMEND COMMAND
// =============================================================================

/// Show eligible courses.
pub fn cmd_recommend(
    source: &CatalogSource,
    json_mode: bool,
    completed: &str,
) -> Result<(), PlannerError> {
    let (catalog, _) = load_catalog(source)?;
    let completed = completed_set(completed.split(','));
    let recommendation = eligible(&completed, &catalog);

    if json_mode {
        return print_json(&RecommendResponse::from(&recommendation));
    }

    println!("Completed credits: {}", recommendation.total_credits);
    println!("Progress level:    {}", progress_level(&completed, &catalog));
    println!();
    if recommendation.courses.is_empty() {
        println!("No eligible courses");
    }
    for entry in &recommendation.courses {
        println!(
            "  [{}] {:<12} {} ({} cr)",
            entry.course.level, entry.course.code, entry.course.name, entry.course.credits
        );
    }
    Ok(())
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Compute and print an optimal plan.
pub fn cmd_plan(
    source: &CatalogSource,
    config: Option<&Path>,
    json_mode: bool,
    completed: &str,
    max_credits: Option<u32>,
    flexible: bool,
    verify: bool,
) -> Result<(), PlannerError> {
    let settings = PlannerSettings::load(config)?;
    let (catalog, _) = load_catalog(source)?;
    let completed = completed_set(completed.split(','));
    let request = PlanRequest {
        max_credits: max_credits.unwrap_or(settings.max_credits),
        flexible,
    };

    let optimizer = PlanOptimizer::new(settings.optimizer_config());
    tracing::info!(
        solver = optimizer.solver_name(),
        max_credits = request.max_credits,
        flexible,
        "Planning"
    );

    let outcome = optimizer.plan_remaining(&completed, &catalog, &request)?;
    let plan = require_plan(outcome, &settings, request.max_credits)?;

    if verify {
        plan.verify(&catalog, &catalog.remaining(&completed), request.max_credits)?;
        tracing::info!("Plan verified");
    }

    if json_mode {
        return print_json(&OptimizeResponse::from(&plan));
    }

    println!("Progress level: {}", plan.level);
    println!(
        "Terms needed:   {}",
        if plan.terms.is_empty() { 0 } else { plan.makespan() + 1 }
    );
    for term in &plan.terms {
        println!();
        println!("Term {} ({} credits)", term.index + 1, term.credits);
        for course in &term.courses {
            println!(
                "  [{}] {:<12} {} ({} cr)",
                course.level, course.code, course.name, course.credits
            );
        }
    }
    Ok(())
}

/// Turn a plan outcome into the plan, or a failure that keeps its kind.
fn require_plan(
    outcome: PlanOutcome,
    settings: &PlannerSettings,
    max_credits: u32,
) -> Result<Plan, PlannerError> {
    match outcome {
        PlanOutcome::Planned(plan) => Ok(plan),
        PlanOutcome::Infeasible => Err(PlannerError::Infeasible {
            horizon: settings.horizon,
            max_credits,
        }),
        PlanOutcome::TimedOut => Err(PlannerError::SolveTimeout {
            ms: settings.solve_timeout_ms,
        }),
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Load the catalog and report what was found.
pub fn cmd_validate(
    source: &CatalogSource,
    json_mode: bool,
    verbose: bool,
) -> Result<(), PlannerError> {
    let (catalog, report) = load_catalog(source)?;

    if json_mode {
        let skipped: Vec<_> = report
            .skipped_prerequisites
            .iter()
            .map(|(course, missing)| serde_json::json!({ "course": course, "missing": missing }))
            .collect();
        return print_json(&serde_json::json!({
            "catalog": source.path.to_string_lossy(),
            "valid": true,
            "courses": report.courses,
            "prerequisites": report.edges,
            "skipped_prerequisites": skipped,
        }));
    }

    println!("Catalog OK: {:?}", source.path);
    println!("  Courses:       {}", report.courses);
    println!("  Prerequisites: {}", report.edges);
    println!("  Skipped:       {}", report.skipped_prerequisites.len());
    if verbose {
        for (course, missing) in &report.skipped_prerequisites {
            println!("    {} -> unknown prerequisite {}", course, missing);
        }
        println!();
        println!("Topological order:");
        for code in catalog.topological_order() {
            println!("  {}", code);
        }
    }
    Ok(())
}

// =============================================================================
// MIRROR COMMANDS
// =============================================================================

/// Replace the content of a redb mirror with the catalog.
pub fn cmd_mirror(source: &CatalogSource, json_mode: bool, db: &Path) -> Result<(), PlannerError> {
    let (catalog, _) = load_catalog(source)?;
    let mut store = RedbCatalog::open(db)?;
    let stats = store.mirror(&catalog)?;
    tracing::info!(
        courses = stats.courses,
        prerequisites = stats.prerequisites,
        "Catalog mirrored to {:?}",
        db
    );

    if json_mode {
        return print_json(&serde_json::json!({
            "database": db.to_string_lossy(),
            "courses": stats.courses,
            "prerequisites": stats.prerequisites,
        }));
    }

    println!(
        "Mirrored {} courses and {} prerequisites to {:?}",
        stats.courses, stats.prerequisites, db
    );
    Ok(())
}

/// Read a mirror back and print its counts.
pub fn cmd_inspect(json_mode: bool, db: &Path, verbose: bool) -> Result<(), PlannerError> {
    let path = validate_file_path(db)?;
    let store = RedbCatalog::open(&path)?;
    let stats = store.stats()?;
    let catalog = store.load()?;

    if json_mode {
        let entries: Vec<CatalogEntry> = catalog
            .courses_by_level()
            .into_iter()
            .map(CatalogEntry::from)
            .collect();
        return print_json(&serde_json::json!({
            "database": db.to_string_lossy(),
            "courses": stats.courses,
            "prerequisites": stats.prerequisites,
            "catalog": entries,
        }));
    }

    println!("Pensum Catalog Mirror");
    println!("=====================");
    println!("Database:      {:?}", db);
    println!("Courses:       {}", stats.courses);
    println!("Prerequisites: {}", stats.prerequisites);
    if verbose {
        println!();
        for course in catalog.courses_by_level() {
            let prereqs: Vec<&str> = catalog
                .prerequisites_of(&course.code)
                .map(|c| c.as_str())
                .collect();
            println!(
                "  [{}] {:<12} <- {}",
                course.level,
                course.code,
                prereqs.join(", ")
            );
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
