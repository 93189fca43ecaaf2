//! Query pipeline
//!
//! Wires retrieval and reranking into one call:
//!
//! ```text
//! query text ─► Retriever (embed + vector search + filter) ─► candidates
//!            ─► Reranker (graph lookups + fusion)          ─► ranked sections
//! ```
//!
//! [`Pipeline::query`] uses the query text itself as the reference case for
//! graph lookups, so free-text queries normally rank on semantics alone.
//! [`Pipeline::query_with`] takes an explicit reference case instead.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphProximity, RelationGraph, SqliteGraph};
use crate::search::embeddings::{Embedder, build_embedder};
use crate::search::rerank::{FusionWeights, RankedSection, Reranker};
use crate::search::retriever::{Retriever, SectionFilter};
use crate::search::vector::{DistanceMetric, SqliteVectorStore, VectorStore};

pub const DEFAULT_TOP_K: usize = 10;

/// Options for a single query
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub text: String,
    /// Section label or title; `None` or a wildcard alias accepts all
    pub section: Option<String>,
    /// Case to measure graph proximity against; defaults to `text`
    pub reference_case_id: Option<String>,
    pub top_k: Option<usize>,
    pub weights: Option<FusionWeights>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    #[must_use]
    pub fn reference_case(mut self, case_id: impl Into<String>) -> Self {
        self.reference_case_id = Some(case_id.into());
        self
    }

    #[must_use]
    pub const fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    #[must_use]
    pub const fn weights(mut self, weights: FusionWeights) -> Self {
        self.weights = Some(weights);
        self
    }
}

/// Hybrid retrieval pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    retriever: Retriever,
    reranker: Reranker,
    top_k: usize,
    weights: FusionWeights,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        graph: Arc<dyn RelationGraph>,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, store),
            reranker: Reranker::new(GraphProximity::new(graph)),
            top_k: DEFAULT_TOP_K,
            weights: FusionWeights::default(),
        }
    }

    /// Pipeline over explicit backends with search and graph settings from `config`.
    pub fn with_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        graph: Arc<dyn RelationGraph>,
    ) -> Result<Self> {
        let proximity = GraphProximity::new(graph)
            .with_timeout(Duration::from_millis(config.graph.timeout_ms))
            .with_parallel(config.graph.parallel_lookups);
        Ok(Self {
            retriever: Retriever::new(embedder, store),
            reranker: Reranker::new(proximity),
            top_k: config.search.top_k as usize,
            weights: FusionWeights::new(config.search.alpha, config.search.beta)?,
        })
    }

    /// Pipeline over the SQLite vector store and graph at `db_path`.
    pub fn open(config: &Config, db_path: &Path) -> Result<Self> {
        let embedder = build_embedder(&config.search)?;
        let metric = DistanceMetric::parse(&config.search.distance_metric)?;
        let store = SqliteVectorStore::new(db_path, embedder.dims(), metric)
            .with_embedder_type(embedder.name());
        let graph = SqliteGraph::new(db_path);
        Self::with_config(config, embedder, Arc::new(store), Arc::new(graph))
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[must_use]
    pub const fn reranker(&self) -> &Reranker {
        &self.reranker
    }

    /// Rank sections for `query_text`, optionally restricted to one section type.
    pub fn query(&self, query_text: &str, section_type: Option<&str>) -> Result<Vec<RankedSection>> {
        let mut request = QueryRequest::new(query_text);
        request.section = section_type.map(ToString::to_string);
        self.query_with(&request)
    }

    pub fn query_with(&self, request: &QueryRequest) -> Result<Vec<RankedSection>> {
        let started = Instant::now();
        let filter = SectionFilter::from_option(request.section.as_deref());
        let top_k = request.top_k.unwrap_or(self.top_k);
        let weights = request.weights.unwrap_or(self.weights);

        let candidates = self.retriever.retrieve(&request.text, &filter, top_k)?;
        if candidates.is_empty() {
            info!(filter = %filter, top_k, "no candidates");
            return Ok(Vec::new());
        }

        let reference = request
            .reference_case_id
            .as_deref()
            .unwrap_or(&request.text);
        let results = self
            .reranker
            .rerank(candidates, reference, filter.label(), weights);

        info!(
            results = results.len(),
            filter = %filter,
            elapsed_ms = started.elapsed().as_millis(),
            "query complete"
        );
        Ok(results)
    }
}
