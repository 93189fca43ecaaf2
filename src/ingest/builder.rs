//! Graph building from loaded case records

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::ingest::records::LoadedCases;
use crate::storage::Database;

/// Summary of one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub records: usize,
    pub dropped: usize,
    pub cases: usize,
    pub sections: usize,
}

/// Write every loaded case and section into the graph store in one transaction.
pub fn build_graph(db: &Database, loaded: &LoadedCases) -> Result<IngestReport> {
    let stats = db.write_cases(&loaded.cases)?;
    let report = IngestReport {
        records: loaded.records,
        dropped: loaded.dropped,
        cases: stats.cases,
        sections: stats.sections,
    };
    info!(
        cases = report.cases,
        sections = report.sections,
        dropped = report.dropped,
        "graph written"
    );
    Ok(report)
}
