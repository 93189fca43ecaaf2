//! Relation graph of cases and their sections
//!
//! Cases own sections through a typed `HAS_SECTION` edge. The retrieval core
//! only needs one read query from the graph, so backends implement the narrow
//! [`RelationGraph`] trait:
//!
//! - [`MemoryGraph`]: adjacency maps, used in tests and for small corpora
//! - [`SqliteGraph`]: the persisted graph written by `lexgraph ingest`
//!
//! [`GraphProximity`] turns shared-section counts into a distance and wraps
//! every lookup in an explicit [`GraphSignal`].

pub mod memory;
pub mod proximity;
pub mod sqlite;

pub use memory::MemoryGraph;
pub use proximity::{GraphProximity, GraphSignal, graph_distance};
pub use sqlite::SqliteGraph;

use crate::error::Result;

/// Read-only relation graph capability
pub trait RelationGraph: Send + Sync {
    /// Count `case_a -> section <- case_b` paths.
    ///
    /// With `section_type`, only shared sections whose label matches are
    /// counted, whatever type the two edges carry. The count is symmetric.
    fn count_shared_sections(
        &self,
        case_a: &str,
        case_b: &str,
        section_type: Option<&str>,
    ) -> Result<u64>;
}
