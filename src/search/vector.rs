//! Vector index boundary
//!
//! Stores one [`EmbeddingRecord`] per section and answers nearest-neighbour
//! queries with distances (smaller is closer). Two backends share the
//! [`VectorStore`] trait: an in-memory brute-force index and a SQLite-backed
//! store that persists vectors next to the case graph.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{LgError, Result};
use crate::storage::Database;

/// Metadata snapshot stored with every vector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetadata {
    pub section_id: String,
    pub label: String,
    pub case_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub case_type: String,
    pub court: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub section_id: String,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: SectionMetadata,
}

/// One nearest-neighbour match
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub document: String,
    pub metadata: SectionMetadata,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Squared euclidean distance
    #[default]
    L2,
    /// `1 - cosine similarity`
    Cosine,
}

impl DistanceMetric {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "l2" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            other => Err(LgError::Config(format!(
                "invalid distance metric {other} (expected l2|cosine)"
            ))),
        }
    }

    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Cosine => 1.0 - crate::search::embeddings::cosine_similarity(a, b),
        }
    }
}

/// Nearest-neighbour search service
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite the record keyed by its section id.
    fn upsert(&self, record: EmbeddingRecord) -> Result<()>;

    /// Up to `top_k` records ordered by ascending distance.
    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorHit>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn check_record(record: &EmbeddingRecord, dims: usize) -> Result<()> {
    if record.document.trim().is_empty() {
        return Err(LgError::EmptyInput(format!(
            "section {} has no content to index",
            record.section_id
        )));
    }
    if record.vector.len() != dims {
        return Err(LgError::InvalidInput(format!(
            "embedding dims mismatch for {}: expected {dims}, got {}",
            record.section_id,
            record.vector.len()
        )));
    }
    Ok(())
}

fn rank_nearest<'a, I>(candidates: I, query: &[f32], metric: DistanceMetric, top_k: usize) -> Vec<(f32, &'a EmbeddingRecord)>
where
    I: Iterator<Item = &'a EmbeddingRecord>,
{
    let mut scored: Vec<(f32, &EmbeddingRecord)> = candidates
        .map(|record| (metric.distance(query, &record.vector), record))
        .collect();
    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.section_id.cmp(&b.1.section_id))
    });
    scored.truncate(top_k);
    scored
}

fn to_hit(distance: f32, record: &EmbeddingRecord) -> VectorHit {
    VectorHit {
        id: record.section_id.clone(),
        document: record.document.clone(),
        metadata: record.metadata.clone(),
        distance,
    }
}

/// In-memory vector index
#[derive(Debug)]
pub struct VectorIndex {
    records: RwLock<HashMap<String, EmbeddingRecord>>,
    dims: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Create a new empty vector index
    #[must_use]
    pub fn new(dims: usize) -> Self {
        Self::with_metric(dims, DistanceMetric::default())
    }

    #[must_use]
    pub fn with_metric(dims: usize, metric: DistanceMetric) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            dims,
            metric,
        }
    }

    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Remove a record by section id
    pub fn remove(&self, section_id: &str) -> Option<EmbeddingRecord> {
        self.records.write().remove(section_id)
    }
}

impl VectorStore for VectorIndex {
    fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        check_record(&record, self.dims)?;
        self.records
            .write()
            .insert(record.section_id.clone(), record);
        Ok(())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorHit>> {
        if vector.len() != self.dims {
            return Err(LgError::BackendUnavailable(format!(
                "query vector has {} dims, index expects {}",
                vector.len(),
                self.dims
            )));
        }

        let records = self.records.read();
        Ok(rank_nearest(records.values(), vector, self.metric, top_k)
            .into_iter()
            .map(|(distance, record)| to_hit(distance, record))
            .collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }
}

const READ_BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Vector store persisted in the lexgraph SQLite database
///
/// Each call opens its own connection, so the store is `Sync` and a failed
/// query never leaves a connection behind.
#[derive(Debug, Clone)]
pub struct SqliteVectorStore {
    db_path: PathBuf,
    dims: usize,
    metric: DistanceMetric,
    embedder_type: String,
}

impl SqliteVectorStore {
    pub fn new(db_path: impl AsRef<Path>, dims: usize, metric: DistanceMetric) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            dims,
            metric,
            embedder_type: "hash".to_string(),
        }
    }

    /// Tag stored vectors with the embedder that produced them.
    #[must_use]
    pub fn with_embedder_type(mut self, embedder_type: impl Into<String>) -> Self {
        self.embedder_type = embedder_type.into();
        self
    }

    /// Writable connection; creates and migrates the database when missing.
    fn open_writer(&self) -> Result<Database> {
        Database::open(&self.db_path)
            .map_err(|err| LgError::BackendUnavailable(format!("vector store: {err}")))
    }

    /// Query-only connection; a missing database is reported, never created.
    fn open_reader(&self) -> Result<Database> {
        Database::open_read_only(&self.db_path, READ_BUSY_TIMEOUT)
            .map_err(|err| LgError::BackendUnavailable(format!("vector store: {err}")))
    }
}

impl VectorStore for SqliteVectorStore {
    fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        check_record(&record, self.dims)?;
        self.open_writer()?.upsert_embedding(&record, &self.embedder_type)
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorHit>> {
        if vector.len() != self.dims {
            return Err(LgError::BackendUnavailable(format!(
                "query vector has {} dims, store expects {}",
                vector.len(),
                self.dims
            )));
        }

        let records = self
            .open_reader()?
            .load_embeddings(&self.embedder_type, self.dims)
            .map_err(|err| LgError::BackendUnavailable(format!("vector store: {err}")))?;

        Ok(rank_nearest(records.iter(), vector, self.metric, top_k)
            .into_iter()
            .map(|(distance, record)| to_hit(distance, record))
            .collect())
    }

    fn len(&self) -> Result<usize> {
        self.open_reader()?
            .count_embeddings(&self.embedder_type, self.dims)
            .map_err(|err| LgError::BackendUnavailable(format!("vector store: {err}")))
    }
}
