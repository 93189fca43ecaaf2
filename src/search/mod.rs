//! Hybrid retrieval of case sections
//!
//! Semantic retrieval over section embeddings, reranked with a structural
//! signal from the relation graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          Query text                            │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │   Retriever: Embedder ─► VectorStore ─► section filter         │
//! │   similarity = 1 / (1 + distance)                              │
//! └────────────────────────────────────────────────────────────────┘
//!                                │  candidates (index order)
//!                                ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │   Reranker: GraphProximity per candidate ─► score fusion       │
//! │   alpha * similarity + beta * 1 / (1 + graph distance)         │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                    Ranked sections (score desc)
//! ```

pub mod embeddings;
pub mod embeddings_api;
pub mod pipeline;
pub mod rerank;
pub mod retriever;
pub mod vector;

// Re-export main types
pub use embeddings::{Embedder, HashEmbedder, build_embedder, cosine_similarity};
pub use embeddings_api::ApiEmbedder;
pub use pipeline::{DEFAULT_TOP_K, Pipeline, QueryRequest};
pub use rerank::{FusionWeights, RankedSection, Reranker, ScoreSource, fuse_and_rank, fuse_score};
pub use retriever::{Candidate, Retriever, SectionFilter, similarity_from_distance};
pub use vector::{
    DistanceMetric, EmbeddingRecord, SectionMetadata, SqliteVectorStore, VectorHit, VectorIndex,
    VectorStore,
};
