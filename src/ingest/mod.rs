//! Loading case records, building the graph and indexing sections

pub mod builder;
pub mod indexer;
pub mod records;

pub use builder::{IngestReport, build_graph};
pub use indexer::{IndexOptions, IndexReport, index_sections};
pub use records::{CaseRecord, LoadedCases, assemble_cases, load_cases, read_records};
