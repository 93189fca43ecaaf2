//! Relation graph backed by the lexgraph SQLite database

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LgError, Result};
use crate::graph::RelationGraph;
use crate::storage::Database;

/// Read-only view of the persisted case graph
///
/// Holds only the database path; every lookup opens and drops its own
/// read-only connection.
#[derive(Debug, Clone)]
pub struct SqliteGraph {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteGraph {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn open(&self) -> Result<Database> {
        Database::open_read_only(&self.db_path, self.busy_timeout)
            .map_err(|err| LgError::GraphLookup(format!("open graph store: {err}")))
    }
}

impl RelationGraph for SqliteGraph {
    fn count_shared_sections(
        &self,
        case_a: &str,
        case_b: &str,
        section_type: Option<&str>,
    ) -> Result<u64> {
        self.open()?
            .count_shared_sections(case_a, case_b, section_type)
            .map_err(|err| LgError::GraphLookup(err.to_string()))
    }
}
