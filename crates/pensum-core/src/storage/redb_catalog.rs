//! # redb-backed Catalog Mirror
//!
//! Writes the curriculum graph to a redb database and reads it back.
//!
//! Layout:
//! - `courses`: code -> postcard-encoded `Course`
//! - `prerequisites`: `(prerequisite, dependent)` -> `()`
//! - `metadata`: key -> count
//!
//! A mirror run replaces the whole content in one transaction, so readers
//! see either the previous catalog or the new one, never a mix.

use crate::catalog::Catalog;
use crate::{Course, CourseCode, PlannerError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for courses: code -> serialized Course bytes
const COURSES: TableDefinition<&str, &[u8]> = TableDefinition::new("courses");

/// Table for prerequisite edges: (prerequisite, dependent) -> ()
const PREREQUISITES: TableDefinition<(&str, &str), ()> = TableDefinition::new("prerequisites");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const META_COURSES: &str = "courses";
const META_PREREQUISITES: &str = "prerequisites";

fn storage_err(e: impl std::fmt::Display) -> PlannerError {
    PlannerError::StorageError(e.to_string())
}

/// Counts recorded by the last mirror run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorStats {
    pub courses: u64,
    pub prerequisites: u64,
}

/// A disk-backed copy of a `Catalog`.
pub struct RedbCatalog {
    db: Database,
}

impl std::fmt::Debug for RedbCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCatalog").finish_non_exhaustive()
    }
}

impl RedbCatalog {
    /// Open or create a mirror database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(COURSES).map_err(storage_err)?;
            let _ = write_txn.open_table(PREREQUISITES).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }

    /// Replace the stored catalog with `catalog`.
    ///
    /// Courses and edges are written in catalog order inside a single
    /// transaction. Running it twice with the same catalog leaves the
    /// database unchanged.
    pub fn mirror(&mut self, catalog: &Catalog) -> Result<MirrorStats, PlannerError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;

        write_txn.delete_table(COURSES).map_err(storage_err)?;
        write_txn.delete_table(PREREQUISITES).map_err(storage_err)?;

        let mut stats = MirrorStats::default();
        {
            let mut courses_table = write_txn.open_table(COURSES).map_err(storage_err)?;
            let mut edges_table = write_txn.open_table(PREREQUISITES).map_err(storage_err)?;
            let mut meta_table = write_txn.open_table(METADATA).map_err(storage_err)?;

            for course in catalog.courses() {
                let bytes = postcard::to_allocvec(course)
                    .map_err(|e| PlannerError::SerializationError(e.to_string()))?;
                courses_table
                    .insert(course.code.as_str(), bytes.as_slice())
                    .map_err(storage_err)?;
                stats.courses = stats.courses.saturating_add(1);
            }

            for (prereq, dependent) in catalog.edges() {
                edges_table
                    .insert((prereq.as_str(), dependent.as_str()), ())
                    .map_err(storage_err)?;
                stats.prerequisites = stats.prerequisites.saturating_add(1);
            }

            meta_table
                .insert(META_COURSES, stats.courses)
                .map_err(storage_err)?;
            meta_table
                .insert(META_PREREQUISITES, stats.prerequisites)
                .map_err(storage_err)?;
        }

        write_txn.commit().map_err(storage_err)?;
        Ok(stats)
    }

    /// Rebuild a `Catalog` from the stored content.
    ///
    /// The usual catalog checks run again, so a tampered database with a
    /// cycle or a dangling edge is rejected.
    pub fn load(&self) -> Result<Catalog, PlannerError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let courses_table = read_txn.open_table(COURSES).map_err(storage_err)?;
        let edges_table = read_txn.open_table(PREREQUISITES).map_err(storage_err)?;

        let mut builder = Catalog::builder();
        for entry in courses_table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            let course: Course = postcard::from_bytes(value.value())
                .map_err(|e| PlannerError::DeserializationError(e.to_string()))?;
            builder.add_course(course)?;
        }
        for entry in edges_table.iter().map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            let (prereq, dependent) = key.value();
            builder.add_prerequisite(&CourseCode::new(prereq), &CourseCode::new(dependent))?;
        }
        builder.build()
    }

    /// Look up a single stored course.
    pub fn course(&self, code: &CourseCode) -> Result<Option<Course>, PlannerError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(COURSES).map_err(storage_err)?;
        table
            .get(code.as_str())
            .map_err(storage_err)?
            .map(|data| {
                postcard::from_bytes(data.value())
                    .map_err(|e| PlannerError::DeserializationError(e.to_string()))
            })
            .transpose()
    }

    /// Counts written by the last mirror run.
    pub fn stats(&self) -> Result<MirrorStats, PlannerError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(METADATA).map_err(storage_err)?;
        let read = |key: &str| -> Result<u64, PlannerError> {
            Ok(table
                .get(key)
                .map_err(storage_err)?
                .map(|v| v.value())
                .unwrap_or(0))
        };
        Ok(MirrorStats {
            courses: read(META_COURSES)?,
            prerequisites: read(META_PREREQUISITES)?,
        })
    }

    /// Number of stored courses.
    pub fn course_count(&self) -> Result<usize, PlannerError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(COURSES).map_err(storage_err)?;
        let count = table.len().map_err(storage_err)?;
        Ok(count as usize)
    }

    /// Number of stored prerequisite edges.
    pub fn edge_count(&self) -> Result<usize, PlannerError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(PREREQUISITES).map_err(storage_err)?;
        let count = table.len().map_err(storage_err)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        let mut builder = Catalog::builder();
        builder
            .add_course(Course::new("X1", "Intro", 3, 1).with_category("core"))
            .expect("add");
        builder.add_course(Course::new("X2", "Next", 3, 2)).expect("add");
        builder
            .add_course(Course::new("X3", "Capstone", 5, 3).with_min_credits(6))
            .expect("add");
        builder
            .add_prerequisite(&CourseCode::new("X1"), &CourseCode::new("X2"))
            .expect("edge");
        builder
            .add_prerequisite(&CourseCode::new("X2"), &CourseCode::new("X3"))
            .expect("edge");
        builder.build().expect("build")
    }

    #[test]
    fn mirror_writes_counts() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbCatalog::open(temp.path().join("mirror.redb")).expect("open db");

        let stats = store.mirror(&catalog()).expect("mirror");
        assert_eq!(stats, MirrorStats { courses: 3, prerequisites: 2 });
        assert_eq!(store.course_count().expect("count"), 3);
        assert_eq!(store.edge_count().expect("count"), 2);
        assert_eq!(store.stats().expect("stats"), stats);
    }

    #[test]
    fn mirror_then_load_restores_catalog() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("mirror.redb");
        let original = catalog();

        {
            let mut store = RedbCatalog::open(&db_path).expect("open db");
            store.mirror(&original).expect("mirror");
        }

        let store = RedbCatalog::open(&db_path).expect("reopen db");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), original.len());
        assert_eq!(loaded.edge_count(), original.edge_count());
        assert_eq!(loaded.topological_order(), original.topological_order());

        let capstone = store
            .course(&CourseCode::new("X3"))
            .expect("read")
            .expect("stored");
        assert_eq!(capstone.min_credits, 6);
        assert!(store.course(&CourseCode::new("NOPE")).expect("read").is_none());
    }

    #[test]
    fn mirror_is_idempotent_and_replaces_old_content() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbCatalog::open(temp.path().join("mirror.redb")).expect("open db");

        store.mirror(&catalog()).expect("mirror");
        store.mirror(&catalog()).expect("mirror again");
        assert_eq!(store.course_count().expect("count"), 3);

        let mut builder = Catalog::builder();
        builder.add_course(Course::new("ONLY", "Alone", 2, 1)).expect("add");
        let smaller = builder.build().expect("build");
        store.mirror(&smaller).expect("mirror smaller");

        assert_eq!(store.course_count().expect("count"), 1);
        assert_eq!(store.edge_count().expect("count"), 0);
        assert!(store.course(&CourseCode::new("X1")).expect("read").is_none());
    }

    #[test]
    fn empty_database_loads_empty_catalog() {
        let temp = tempdir().expect("temp dir");
        let store = RedbCatalog::open(temp.path().join("fresh.redb")).expect("open db");
        assert!(store.load().expect("load").is_empty());
        assert_eq!(store.stats().expect("stats"), MirrorStats::default());
    }
}
