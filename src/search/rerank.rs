//! Hybrid reranking
//!
//! Fuses the semantic similarity of each candidate with its graph proximity
//! to a reference case:
//!
//! ```text
//! linked:            score = alpha * cosine + beta * 1 / (1 + distance)
//! unlinked/failed:   score = cosine
//! ```
//!
//! Results are sorted by score, descending. The sort is stable, so equal
//! scores keep their retrieval order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LgError, Result};
use crate::graph::{GraphProximity, GraphSignal};
use crate::search::retriever::Candidate;

/// Fusion weights for the semantic and structural terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            beta: 0.3,
        }
    }
}

impl FusionWeights {
    /// Weights need not sum to 1 but must be finite and non-negative.
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LgError::InvalidInput(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(Self { alpha, beta })
    }
}

/// Which branch produced a result's score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Hybrid,
    SemanticOnly,
}

/// Fuse a cosine score with a graph signal.
#[must_use]
pub fn fuse_score(cosine: f64, signal: &GraphSignal, weights: FusionWeights) -> (f64, ScoreSource) {
    signal.structural_score().map_or((cosine, ScoreSource::SemanticOnly), |structural| {
        (
            weights.alpha.mul_add(cosine, weights.beta * structural),
            ScoreSource::Hybrid,
        )
    })
}

/// A reranked section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSection {
    pub case_id: String,
    pub label: String,
    pub section_id: String,
    pub title: String,
    pub court: String,
    #[serde(rename = "type")]
    pub case_type: String,
    pub content: String,
    pub score: f64,
    pub source: ScoreSource,
    pub graph: GraphSignal,
}

impl RankedSection {
    fn new(candidate: Candidate, score: f64, source: ScoreSource, graph: GraphSignal) -> Self {
        Self {
            case_id: candidate.case_id,
            label: candidate.label,
            section_id: candidate.section_id,
            title: candidate.title,
            court: candidate.court,
            case_type: candidate.case_type,
            content: candidate.content,
            score,
            source,
            graph,
        }
    }
}

/// Score every candidate against its signal and sort.
///
/// `signals` must line up with `candidates`; a missing signal counts as a
/// failed lookup.
#[must_use]
pub fn fuse_and_rank(
    candidates: Vec<Candidate>,
    signals: Vec<GraphSignal>,
    weights: FusionWeights,
) -> Vec<RankedSection> {
    let mut signals = signals.into_iter();
    let mut ranked: Vec<RankedSection> = candidates
        .into_iter()
        .map(|candidate| {
            let signal = signals.next().unwrap_or_else(|| GraphSignal::Failed {
                reason: "no graph signal for candidate".to_string(),
            });
            let (score, source) = fuse_score(candidate.similarity, &signal, weights);
            RankedSection::new(candidate, score, source, signal)
        })
        .collect();
    sort_by_score(&mut ranked);
    ranked
}

/// Stable descending sort by score.
pub fn sort_by_score(results: &mut [RankedSection]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Hybrid reranker over a graph proximity scorer
#[derive(Debug, Clone)]
pub struct Reranker {
    proximity: GraphProximity,
}

impl Reranker {
    #[must_use]
    pub const fn new(proximity: GraphProximity) -> Self {
        Self { proximity }
    }

    #[must_use]
    pub const fn proximity(&self) -> &GraphProximity {
        &self.proximity
    }

    /// Rerank candidates by proximity of their cases to `reference_case_id`.
    ///
    /// Graph failures never abort the rerank; the affected candidate keeps
    /// its semantic score.
    pub fn rerank(
        &self,
        candidates: Vec<Candidate>,
        reference_case_id: &str,
        section_type: Option<&str>,
        weights: FusionWeights,
    ) -> Vec<RankedSection> {
        let case_ids: Vec<&str> = candidates.iter().map(|c| c.case_id.as_str()).collect();
        let signals = self
            .proximity
            .signals(&case_ids, reference_case_id, section_type);

        let hybrid = signals
            .iter()
            .filter(|signal| matches!(signal, GraphSignal::Linked { .. }))
            .count();
        let failed = signals.iter().filter(|signal| signal.is_failed()).count();
        debug!(
            candidates = candidates.len(),
            hybrid,
            failed,
            reference = reference_case_id,
            "reranking"
        );

        fuse_and_rank(candidates, signals, weights)
    }
}
