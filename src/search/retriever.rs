//! Candidate retrieval
//!
//! Embeds the query, asks the vector store for the nearest sections and turns
//! distances into similarity scores with `1 / (1 + d)`. Candidates come back
//! in the store's distance order and are never re-sorted here.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::core::SectionType;
use crate::error::{LgError, Result};
use crate::search::embeddings::Embedder;
use crate::search::vector::{VectorHit, VectorStore};

/// Section-type filter for retrieval
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionFilter {
    /// Accept every label
    #[default]
    Any,
    /// Accept one label, compared case-insensitively
    Label(String),
}

impl SectionFilter {
    /// Values treated as the wildcard, besides `*` and the empty string.
    pub const WILDCARD_ALIASES: [&'static str; 3] = ["all", "any", "none"];

    /// Parse a user-supplied filter.
    ///
    /// Known section titles ("Precedent Analysis") resolve to their label.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty()
            || value == "*"
            || Self::WILDCARD_ALIASES
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(value))
        {
            return Self::Any;
        }
        SectionType::parse(value).map_or_else(
            || Self::Label(value.to_string()),
            |ty| Self::Label(ty.label().to_string()),
        )
    }

    #[must_use]
    pub fn from_option(value: Option<&str>) -> Self {
        value.map_or(Self::Any, Self::parse)
    }

    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Label(wanted) => wanted.eq_ignore_ascii_case(label.trim()),
        }
    }

    /// Concrete label to hand to the graph, `None` for the wildcard.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Label(label) => Some(label.as_str()),
        }
    }

    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for SectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl FromStr for SectionFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Map a vector distance into `(0, 1]`; smaller distances score higher.
#[must_use]
pub fn similarity_from_distance(distance: f64) -> f64 {
    1.0 / (1.0 + distance.max(0.0))
}

/// A retrieved section with its semantic score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub case_id: String,
    pub label: String,
    pub section_id: String,
    pub title: String,
    pub court: String,
    #[serde(rename = "type")]
    pub case_type: String,
    pub content: String,
    pub similarity: f64,
}

impl Candidate {
    #[must_use]
    pub fn from_hit(hit: VectorHit) -> Self {
        let similarity = similarity_from_distance(f64::from(hit.distance));
        let content = if hit.metadata.content.is_empty() {
            hit.document
        } else {
            hit.metadata.content
        };
        Self {
            case_id: hit.metadata.case_id,
            label: hit.metadata.label,
            section_id: hit.id,
            title: hit.metadata.title,
            court: hit.metadata.court,
            case_type: hit.metadata.case_type,
            content,
            similarity,
        }
    }
}

/// Embedder plus vector store
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    #[must_use]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Up to `top_k` candidates matching `filter`, nearest first.
    ///
    /// Embedder and store failures surface as [`LgError::BackendUnavailable`].
    pub fn retrieve(
        &self,
        query_text: &str,
        filter: &SectionFilter,
        top_k: usize,
    ) -> Result<Vec<Candidate>> {
        if query_text.trim().is_empty() {
            return Err(LgError::EmptyInput("query text is empty".to_string()));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedder
            .embed(query_text)
            .map_err(|err| backend_error("embedder", err))?;
        let hits = self
            .store
            .query(&vector, top_k)
            .map_err(|err| backend_error("vector store", err))?;
        let returned = hits.len();

        let candidates: Vec<Candidate> = hits
            .into_iter()
            .filter(|hit| filter.matches(&hit.metadata.label))
            .map(Candidate::from_hit)
            .collect();

        debug!(
            returned,
            kept = candidates.len(),
            filter = %filter,
            "retrieved candidates"
        );
        Ok(candidates)
    }
}

fn backend_error(stage: &str, err: LgError) -> LgError {
    if err.is_backend_unavailable() {
        err
    } else {
        LgError::BackendUnavailable(format!("{stage}: {err}"))
    }
}
