//! Section indexing
//!
//! Embeds every stored section and upserts one embedding record per section
//! into a vector store. Per-section failures are counted, not fatal.

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::search::embeddings::Embedder;
use crate::search::vector::{EmbeddingRecord, VectorStore};
use crate::storage::{Database, SectionRow, content_hash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Skip sections whose stored vector was computed from identical content
    /// by the same embedder. Only meaningful when `store` persists into `db`.
    pub skip_unchanged: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            skip_unchanged: true,
        }
    }
}

/// Summary of one indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub sections: usize,
    pub indexed: usize,
    pub unchanged: usize,
    pub skipped_empty: usize,
    pub failed: usize,
}

/// Index every section stored in `db` into `store`.
///
/// `progress` is advanced once per section; pass [`ProgressBar::hidden`]
/// when no output is wanted.
pub fn index_sections(
    db: &Database,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    options: IndexOptions,
    progress: &ProgressBar,
) -> Result<IndexReport> {
    let rows = db.list_section_rows()?;
    let mut report = IndexReport {
        sections: rows.len(),
        ..IndexReport::default()
    };
    progress.set_length(rows.len() as u64);

    for row in &rows {
        progress.set_message(row.section_id.clone());
        match index_row(db, embedder, store, options, row) {
            Ok(RowOutcome::Indexed) => report.indexed += 1,
            Ok(RowOutcome::Unchanged) => report.unchanged += 1,
            Ok(RowOutcome::Empty) => {
                warn!(section = %row.section_id, "skipped section with empty content");
                report.skipped_empty += 1;
            }
            Err(err) => {
                warn!(section = %row.section_id, error = %err, "failed to index section");
                report.failed += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        indexed = report.indexed,
        unchanged = report.unchanged,
        skipped_empty = report.skipped_empty,
        failed = report.failed,
        embedder = embedder.name(),
        "indexing complete"
    );
    Ok(report)
}

enum RowOutcome {
    Indexed,
    Unchanged,
    Empty,
}

fn index_row(
    db: &Database,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    options: IndexOptions,
    row: &SectionRow,
) -> Result<RowOutcome> {
    let content = row.content.trim();
    if content.is_empty() {
        return Ok(RowOutcome::Empty);
    }

    if options.skip_unchanged {
        let stored = db.get_embedding_hash(&row.section_id, embedder.name(), embedder.dims())?;
        if stored.as_deref() == Some(content_hash(content).as_str()) {
            debug!(section = %row.section_id, "content unchanged");
            return Ok(RowOutcome::Unchanged);
        }
    }

    let vector = embedder.embed(content)?;
    let mut metadata = row.metadata();
    metadata.content = content.to_string();
    store.upsert(EmbeddingRecord {
        section_id: row.section_id.clone(),
        vector,
        document: content.to_string(),
        metadata,
    })?;
    Ok(RowOutcome::Indexed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Case, SectionType};
    use crate::error::LgError;
    use crate::search::embeddings::HashEmbedder;
    use crate::search::vector::{DistanceMetric, SqliteVectorStore, VectorIndex};
    use tempfile::tempdir;

    struct FlakyEmbedder;

    impl Embedder for FlakyEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                Err(LgError::BackendUnavailable("model crashed".to_string()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
        fn dims(&self) -> usize {
            2
        }
        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn seeded_db(dir: &std::path::Path) -> Database {
        let db = Database::open(dir.join("lex.db")).unwrap();
        let case = Case::new("Case_0", "CIT v. Arora")
            .with_type("Tax")
            .with_court("Delhi High Court");
        let sections = vec![
            case.section(SectionType::Facts, "assessee sold agricultural land"),
            case.section(SectionType::Issues, "whether capital gains arise"),
            case.section(SectionType::Conclusion, "poison pill"),
        ];
        db.write_cases(&[(case, sections)]).unwrap();
        db
    }

    #[test]
    fn indexes_all_sections_into_memory() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());
        let embedder = HashEmbedder::new(32);
        let index = VectorIndex::new(32);

        let report = index_sections(
            &db,
            &embedder,
            &index,
            IndexOptions {
                skip_unchanged: false,
            },
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(report.sections, 3);
        assert_eq!(report.indexed, 3);
        assert_eq!(index.len().unwrap(), 3);

        // Exact section text sits at distance zero from its own vector
        let hits = index
            .query(&embedder.embed_text("whether capital gains arise"), 1)
            .unwrap();
        assert_eq!(hits[0].id, "Case_0_Issues");
        assert!(hits[0].distance.abs() < 1e-5);
        assert_eq!(hits[0].metadata.label, "Issues");
        assert_eq!(hits[0].metadata.court, "Delhi High Court");
        assert_eq!(hits[0].metadata.case_type, "Tax");
    }

    #[test]
    fn unchanged_sections_are_reused() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());
        let embedder = HashEmbedder::new(32);
        let store = SqliteVectorStore::new(dir.path().join("lex.db"), 32, DistanceMetric::L2);

        let first = index_sections(&db, &embedder, &store, IndexOptions::default(), &ProgressBar::hidden())
            .unwrap();
        assert_eq!(first.indexed, 3);

        let second = index_sections(&db, &embedder, &store, IndexOptions::default(), &ProgressBar::hidden())
            .unwrap();
        assert_eq!(second.indexed, 0);
        assert_eq!(second.unchanged, 3);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn embed_failures_are_counted() {
        let dir = tempdir().unwrap();
        let db = seeded_db(dir.path());
        let index = VectorIndex::new(2);

        let report = index_sections(
            &db,
            &FlakyEmbedder,
            &index,
            IndexOptions::default(),
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(index.len().unwrap(), 2);
    }
}
