//! # Ingestor Module
//!
//! Catalog row parsing, validation and catalog construction.
//!
//! - Parse tabular (CSV) or JSON catalog sources
//! - Reject malformed rows, duplicate codes and prerequisite cycles
//! - Drop prerequisite references to codes outside the catalog and report them
//!
//! Reading files is left to the app layer; this module works on bytes.

use crate::catalog::{Catalog, CatalogBuilder};
use crate::primitives::{
    MAX_CATALOG_ROWS, MAX_CODE_LENGTH, MAX_NAME_LENGTH, PREREQUISITE_DELIMITER,
};
use crate::{Course, CourseCode, PlannerError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// ROW AND FORMAT
// =============================================================================

/// One catalog source row, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRow {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub level: u32,
    #[serde(default)]
    pub min_credits: u32,
    #[serde(default)]
    pub category: String,
    /// Prerequisite codes separated by `;`.
    #[serde(default)]
    pub prerequisites: String,
}

/// Supported catalog source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of `CourseRow` objects.
    Json,
}

impl CatalogFormat {
    /// Guess the format from a file extension. Anything but `.json` is CSV.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

impl FromStr for CatalogFormat {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(PlannerError::InvalidRequest(format!(
                "Unknown catalog format: {}",
                other
            ))),
        }
    }
}

/// What catalog construction did besides building the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of courses loaded.
    pub courses: usize,
    /// Number of prerequisite edges loaded.
    pub edges: usize,
    /// `(dependent, missing prerequisite)` pairs that were dropped.
    pub skipped_prerequisites: Vec<(CourseCode, CourseCode)>,
}

// =============================================================================
// INGESTOR
// =============================================================================

/// Column indices resolved from a CSV header.
struct Columns {
    code: usize,
    name: usize,
    credits: usize,
    level: usize,
    min_credits: Option<usize>,
    category: Option<usize>,
    prerequisites: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, PlannerError> {
        let find = |aliases: &[&str]| {
            header.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                aliases.iter().any(|a| h == *a)
            })
        };
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| PlannerError::MalformedRow {
                line: 1,
                reason: format!("missing column '{}'", aliases[0]),
            })
        };

        Ok(Self {
            code: require(&["code", "codigo"])?,
            name: require(&["name", "nombre"])?,
            credits: require(&["credits", "creditos"])?,
            level: require(&["level", "semestre"])?,
            min_credits: find(&["min_credits", "min_creditos_req"]),
            category: find(&["category", "tipo"]),
            prerequisites: find(&["prerequisites", "prerrequisitos"]),
        })
    }
}

/// The Ingestor turns catalog sources into a validated `Catalog`.
pub struct Ingestor;

impl Ingestor {
    /// Parse and build a catalog from raw source bytes.
    pub fn load(bytes: &[u8], format: CatalogFormat) -> Result<(Catalog, IngestReport), PlannerError> {
        let rows = match format {
            CatalogFormat::Csv => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| PlannerError::DeserializationError(e.to_string()))?;
                Self::parse_csv(text)?
            }
            CatalogFormat::Json => Self::parse_json(bytes)?,
        };
        Self::build_catalog(&rows)
    }

    /// Parse CSV text with a header row into `(line, row)` pairs.
    ///
    /// Header names are matched case-insensitively. Blank lines are skipped.
    /// Fields may be double-quoted; quoted fields cannot span lines.
    pub fn parse_csv(text: &str) -> Result<Vec<(usize, CourseRow)>, PlannerError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_start_matches('\u{feff}')))
            .filter(|(_, l)| !l.trim().is_empty());

        let Some((header_line, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let header = split_csv_line(header)
            .map_err(|reason| PlannerError::MalformedRow { line: header_line, reason })?;
        let columns = Columns::from_header(&header)?;

        let mut rows = Vec::new();
        for (line, raw) in lines {
            if rows.len() >= MAX_CATALOG_ROWS {
                return Err(PlannerError::MalformedRow {
                    line,
                    reason: format!("catalog exceeds {} rows", MAX_CATALOG_ROWS),
                });
            }
            let fields = split_csv_line(raw)
                .map_err(|reason| PlannerError::MalformedRow { line, reason })?;
            let field = |idx: usize| fields.get(idx).map(|f| f.trim()).unwrap_or("");
            let optional = |idx: Option<usize>| idx.map(field).unwrap_or("");
            let number = |idx: usize, name: &str| -> Result<u32, PlannerError> {
                parse_number(field(idx)).map_err(|reason| PlannerError::MalformedRow {
                    line,
                    reason: format!("{}: {}", name, reason),
                })
            };

            let min_credits = match columns.min_credits {
                Some(idx) if !field(idx).is_empty() => number(idx, "min_credits")?,
                _ => 0,
            };

            rows.push((
                line,
                CourseRow {
                    code: field(columns.code).to_string(),
                    name: field(columns.name).to_string(),
                    credits: number(columns.credits, "credits")?,
                    level: number(columns.level, "level")?,
                    min_credits,
                    category: optional(columns.category).to_string(),
                    prerequisites: optional(columns.prerequisites).to_string(),
                },
            ));
        }
        Ok(rows)
    }

    /// Parse a JSON array of rows. Line numbers are 1-based array positions.
    pub fn parse_json(bytes: &[u8]) -> Result<Vec<(usize, CourseRow)>, PlannerError> {
        let rows: Vec<CourseRow> = serde_json::from_slice(bytes)
            .map_err(|e| PlannerError::DeserializationError(e.to_string()))?;
        if rows.len() > MAX_CATALOG_ROWS {
            return Err(PlannerError::MalformedRow {
                line: MAX_CATALOG_ROWS + 1,
                reason: format!("catalog exceeds {} rows", MAX_CATALOG_ROWS),
            });
        }
        Ok(rows.into_iter().enumerate().map(|(i, r)| (i + 1, r)).collect())
    }

    /// Validate a single row and turn it into a `Course`.
    pub fn validate_row(line: usize, row: &CourseRow) -> Result<Course, PlannerError> {
        let code = CourseCode::new(&row.code);
        if code.is_empty() {
            return Err(PlannerError::MalformedRow {
                line,
                reason: "empty course code".to_string(),
            });
        }
        if code.as_str().len() > MAX_CODE_LENGTH {
            return Err(PlannerError::MalformedRow {
                line,
                reason: format!("course code longer than {} bytes", MAX_CODE_LENGTH),
            });
        }
        if code.as_str().contains(PREREQUISITE_DELIMITER) {
            return Err(PlannerError::InvalidCourse {
                code,
                reason: format!("code contains '{}'", PREREQUISITE_DELIMITER),
            });
        }
        if row.credits == 0 {
            return Err(PlannerError::InvalidCourse {
                code,
                reason: "credits must be positive".to_string(),
            });
        }
        if row.name.len() > MAX_NAME_LENGTH || row.category.len() > MAX_NAME_LENGTH {
            return Err(PlannerError::InvalidCourse {
                code,
                reason: format!("name or category longer than {} bytes", MAX_NAME_LENGTH),
            });
        }

        Ok(Course::new(code, row.name.trim(), row.credits, row.level)
            .with_min_credits(row.min_credits)
            .with_category(row.category.trim()))
    }

    /// Validate rows, wire prerequisites and build the catalog.
    ///
    /// Prerequisite codes that name no catalog course are dropped and listed
    /// in the report. Everything else that is wrong aborts construction.
    pub fn build_catalog(rows: &[(usize, CourseRow)]) -> Result<(Catalog, IngestReport), PlannerError> {
        let mut builder = CatalogBuilder::new();
        for (line, row) in rows {
            builder.add_course(Self::validate_row(*line, row)?)?;
        }

        let mut report = IngestReport::default();
        for (_, row) in rows {
            let dependent = CourseCode::new(&row.code);
            for prereq in split_prerequisites(&row.prerequisites) {
                if builder.contains(&prereq) {
                    builder.add_prerequisite(&prereq, &dependent)?;
                } else {
                    report.skipped_prerequisites.push((dependent.clone(), prereq));
                }
            }
        }

        let catalog = builder.build()?;
        report.courses = catalog.len();
        report.edges = catalog.edge_count();
        Ok((catalog, report))
    }
}

/// Split a `;`-delimited prerequisite list, dropping blanks.
pub fn split_prerequisites(raw: &str) -> Vec<CourseCode> {
    raw.split(PREREQUISITE_DELIMITER)
        .map(CourseCode::new)
        .filter(|code| !code.is_empty())
        .collect()
}

/// Parse a non-negative integer column. Accepts a trailing `.0` as written
/// by spreadsheet exports.
fn parse_number(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    digits
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a non-negative integer", raw))
}

/// Split one CSV line into fields, honouring double quotes.
fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

// =============================================================================
// TESTS
// =============================================================================
