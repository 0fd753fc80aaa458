//! # Storage
//!
//! Persistent mirror of the catalog. The in-memory `Catalog` stays the
//! source of truth; the mirror only exists so other tools can inspect the
//! curriculum graph without re-parsing the catalog file.

mod redb_catalog;

pub use redb_catalog::{MirrorStats, RedbCatalog};
