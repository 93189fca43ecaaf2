//! In-memory relation graph

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::core::{Case, Section};
use crate::error::{LgError, Result};
use crate::graph::RelationGraph;

#[derive(Debug, Default)]
struct Adjacency {
    cases: HashMap<String, Case>,
    /// section id -> section label
    sections: HashMap<String, String>,
    /// case id -> (section id -> edge type)
    edges: HashMap<String, BTreeMap<String, String>>,
}

/// Adjacency-map graph
#[derive(Debug, Default)]
pub struct MemoryGraph {
    inner: RwLock<Adjacency>,
}

impl MemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from cases and their sections in one pass.
    pub fn from_cases<'a, I>(cases: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a Case, &'a [Section])>,
    {
        let graph = Self::new();
        for (case, sections) in cases {
            graph.add_case(case.clone());
            for section in sections {
                graph.add_section(section)?;
            }
        }
        Ok(graph)
    }

    pub fn add_case(&self, case: Case) {
        self.inner.write().cases.insert(case.id.clone(), case);
    }

    /// Attach a section to its owning case, which must already exist.
    pub fn add_section(&self, section: &Section) -> Result<()> {
        if !section.has_content() {
            return Ok(());
        }
        self.inner
            .write()
            .sections
            .insert(section.id.clone(), section.label().to_string());
        self.add_edge(&section.case_id, &section.id, section.label())
    }

    /// Add a raw `HAS_SECTION` edge. Both ends must already exist.
    pub fn add_edge(&self, case_id: &str, section_id: &str, section_type: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.cases.contains_key(case_id) {
            return Err(LgError::NotFound(format!("case {case_id}")));
        }
        if !inner.sections.contains_key(section_id) {
            return Err(LgError::NotFound(format!("section {section_id}")));
        }
        inner
            .edges
            .entry(case_id.to_string())
            .or_default()
            .insert(section_id.to_string(), section_type.to_string());
        Ok(())
    }

    #[must_use]
    pub fn case(&self, id: &str) -> Option<Case> {
        self.inner.read().cases.get(id).cloned()
    }

    #[must_use]
    pub fn case_count(&self) -> usize {
        self.inner.read().cases.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.read().edges.values().map(BTreeMap::len).sum()
    }
}

impl RelationGraph for MemoryGraph {
    fn count_shared_sections(
        &self,
        case_a: &str,
        case_b: &str,
        section_type: Option<&str>,
    ) -> Result<u64> {
        // A path needs two distinct edges; a case's own edges never pair up
        if case_a == case_b {
            return Ok(0);
        }
        let inner = self.inner.read();
        let (Some(left), Some(right)) = (inner.edges.get(case_a), inner.edges.get(case_b)) else {
            return Ok(0);
        };

        // The type filter applies to the shared section, not to either edge
        let count = left
            .keys()
            .filter(|section_id| {
                right.contains_key(*section_id)
                    && section_type.is_none_or(|wanted| {
                        inner
                            .sections
                            .get(*section_id)
                            .is_some_and(|label| label == wanted)
                    })
            })
            .count();
        Ok(count as u64)
    }
}
