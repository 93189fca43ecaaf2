//! Graph proximity scoring
//!
//! The structural distance between two cases is derived from the number of
//! sections they share:
//!
//! ```text
//! n > 0   =>  distance = 1 / (n + 1)
//! n == 0  =>  distance = +inf
//! ```
//!
//! Lookups are wrapped in [`GraphSignal`] so callers branch on the outcome
//! instead of catching errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LgError, Result};
use crate::graph::RelationGraph;

/// Distance for a shared-section count.
#[must_use]
pub fn distance_from_count(shared: u64) -> f64 {
    if shared == 0 {
        f64::INFINITY
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = shared as f64;
        1.0 / (n + 1.0)
    }
}

/// Structural distance between two cases, `+inf` when they share nothing.
pub fn graph_distance(
    graph: &dyn RelationGraph,
    case_a: &str,
    case_b: &str,
    section_type: Option<&str>,
) -> Result<f64> {
    let shared = graph.count_shared_sections(case_a, case_b, section_type)?;
    Ok(distance_from_count(shared))
}

/// Outcome of one graph lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphSignal {
    /// Finite distance; the structural term applies
    Linked { distance: f64 },
    /// No shared sections
    Unlinked,
    /// Store error, bad id or timeout
    Failed { reason: String },
}

impl GraphSignal {
    #[must_use]
    pub fn from_distance(result: Result<f64>) -> Self {
        match result {
            Ok(distance) if distance.is_finite() => Self::Linked { distance },
            Ok(_) => Self::Unlinked,
            Err(err) => Self::Failed {
                reason: err.to_string(),
            },
        }
    }

    /// `1 / (1 + distance)` for a linked pair.
    #[must_use]
    pub fn structural_score(&self) -> Option<f64> {
        match self {
            Self::Linked { distance } => Some(1.0 / (1.0 + distance)),
            Self::Unlinked | Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Default cap on lookup workers alive at once, shared by clones.
pub const DEFAULT_MAX_WORKERS: usize = 64;

/// Graph proximity scorer with per-lookup timeout
///
/// A timed lookup runs on its own worker thread. A worker whose lookup
/// times out is detached and keeps running until the store answers, so a
/// hung store could pile up threads. The number of live workers is capped;
/// past the cap a lookup fails immediately and the candidate keeps its
/// semantic score.
#[derive(Clone)]
pub struct GraphProximity {
    graph: Arc<dyn RelationGraph>,
    /// `None` runs lookups inline without a deadline
    timeout: Option<Duration>,
    parallel: bool,
    max_workers: usize,
    live_workers: Arc<AtomicUsize>,
}

/// Releases a worker slot when the lookup thread ends, or if it never starts.
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for GraphProximity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphProximity")
            .field("timeout", &self.timeout)
            .field("parallel", &self.parallel)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl GraphProximity {
    pub fn new(graph: Arc<dyn RelationGraph>) -> Self {
        Self {
            graph,
            timeout: None,
            parallel: true,
            max_workers: DEFAULT_MAX_WORKERS,
            live_workers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bound every lookup; a zero duration disables the deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Cap timed lookup workers alive at once (at least one).
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Timed lookup workers currently alive, including detached ones.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    fn claim_worker(&self) -> Result<WorkerSlot> {
        let claimed = self.live_workers.fetch_add(1, Ordering::AcqRel);
        let slot = WorkerSlot(Arc::clone(&self.live_workers));
        if claimed >= self.max_workers {
            return Err(LgError::GraphLookup(format!(
                "{claimed} graph lookups still pending, limit is {}",
                self.max_workers
            )));
        }
        Ok(slot)
    }

    /// Distance between two cases, honouring the configured timeout.
    pub fn distance(&self, case_a: &str, case_b: &str, section_type: Option<&str>) -> Result<f64> {
        let Some(timeout) = self.timeout else {
            return graph_distance(self.graph.as_ref(), case_a, case_b, section_type);
        };

        let slot = self.claim_worker()?;
        let (tx, rx) = crossbeam_channel::bounded(1);
        let graph = Arc::clone(&self.graph);
        let (a, b) = (case_a.to_string(), case_b.to_string());
        let ty = section_type.map(ToString::to_string);
        std::thread::Builder::new()
            .name("lexgraph-graph-lookup".to_string())
            .spawn(move || {
                let _slot = slot;
                let result = graph_distance(graph.as_ref(), &a, &b, ty.as_deref());
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(LgError::Timeout(format!(
                "graph lookup {case_a} ~ {case_b} exceeded {}ms",
                timeout.as_millis()
            ))),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(LgError::GraphLookup(
                "graph lookup worker exited without a result".to_string(),
            )),
        }
    }

    pub fn signal(&self, case_a: &str, case_b: &str, section_type: Option<&str>) -> GraphSignal {
        let signal = GraphSignal::from_distance(self.distance(case_a, case_b, section_type));
        match &signal {
            GraphSignal::Failed { reason } => {
                warn!(case_a, case_b, reason = %reason, "graph lookup failed, using semantic score");
            }
            GraphSignal::Unlinked => debug!(case_a, case_b, "no shared sections"),
            GraphSignal::Linked { distance } => debug!(case_a, case_b, distance, "graph link"),
        }
        signal
    }

    /// One signal per case id against `reference`, in input order.
    pub fn signals(
        &self,
        case_ids: &[&str],
        reference: &str,
        section_type: Option<&str>,
    ) -> Vec<GraphSignal> {
        if self.parallel && case_ids.len() > 1 {
            case_ids
                .par_iter()
                .map(|case_id| self.signal(case_id, reference, section_type))
                .collect()
        } else {
            case_ids
                .iter()
                .map(|case_id| self.signal(case_id, reference, section_type))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Case, SectionType};
    use crate::graph::MemoryGraph;

    struct FailingGraph;

    impl RelationGraph for FailingGraph {
        fn count_shared_sections(&self, _: &str, _: &str, _: Option<&str>) -> Result<u64> {
            Err(LgError::GraphLookup("connection refused".to_string()))
        }
    }

    struct SlowGraph(Duration);

    impl RelationGraph for SlowGraph {
        fn count_shared_sections(&self, _: &str, _: &str, _: Option<&str>) -> Result<u64> {
            std::thread::sleep(self.0);
            Ok(3)
        }
    }

    /// Case_1 links to both sections owned by Case_0.
    fn memory_graph() -> Arc<dyn RelationGraph> {
        let graph = MemoryGraph::new();
        let owner = Case::new("Case_0", "title");
        graph.add_case(owner.clone());
        graph.add_case(Case::new("Case_1", "other"));
        graph.add_section(&owner.section(SectionType::Facts, "f")).unwrap();
        graph.add_section(&owner.section(SectionType::Issues, "i")).unwrap();
        graph.add_edge("Case_1", "Case_0_Facts", "Facts").unwrap();
        graph.add_edge("Case_1", "Case_0_Issues", "Issues").unwrap();
        Arc::new(graph)
    }

    #[test]
    fn distance_from_count_values() {
        assert!(distance_from_count(0).is_infinite());
        assert!((distance_from_count(1) - 0.5).abs() < 1e-12);
        assert!((distance_from_count(3) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn graph_distance_uses_shared_count() {
        let graph = memory_graph();
        let d = graph_distance(graph.as_ref(), "Case_0", "Case_1", None).unwrap();
        assert!((d - 1.0 / 3.0).abs() < 1e-12);

        let d = graph_distance(graph.as_ref(), "Case_0", "Case_1", Some("Facts")).unwrap();
        assert!((d - 0.5).abs() < 1e-12);

        let d = graph_distance(graph.as_ref(), "Case_0", "tax query", None).unwrap();
        assert!(d.is_infinite());

        let d = graph_distance(graph.as_ref(), "Case_0", "Case_0", None).unwrap();
        assert!(d.is_infinite());
    }

    #[test]
    fn signal_variants() {
        let proximity = GraphProximity::new(memory_graph());
        assert_eq!(
            proximity.signal("Case_0", "Case_1", Some("Facts")),
            GraphSignal::Linked { distance: 0.5 }
        );
        assert_eq!(proximity.signal("Case_0", "other", None), GraphSignal::Unlinked);

        let failing = GraphProximity::new(Arc::new(FailingGraph));
        assert!(failing.signal("Case_0", "Case_0", None).is_failed());
    }

    #[test]
    fn structural_score() {
        let linked = GraphSignal::Linked { distance: 9.0 };
        assert!((linked.structural_score().unwrap() - 0.1).abs() < 1e-12);
        assert!(GraphSignal::Unlinked.structural_score().is_none());
    }

    #[test]
    fn timeout_becomes_failed_signal() {
        let proximity = GraphProximity::new(Arc::new(SlowGraph(Duration::from_millis(500))))
            .with_timeout(Duration::from_millis(20));
        let err = proximity.distance("Case_0", "Case_1", None).unwrap_err();
        assert!(matches!(err, LgError::Timeout(_)));
        assert!(proximity.signal("Case_0", "Case_1", None).is_failed());
    }

    #[test]
    fn stalled_workers_are_capped() {
        let proximity = GraphProximity::new(Arc::new(SlowGraph(Duration::from_millis(400))))
            .with_timeout(Duration::from_millis(10))
            .with_max_workers(2);

        for _ in 0..2 {
            let err = proximity.distance("Case_0", "Case_1", None).unwrap_err();
            assert!(matches!(err, LgError::Timeout(_)));
        }
        assert_eq!(proximity.live_workers(), 2);

        // Over the cap: refused without spawning another thread
        let err = proximity.distance("Case_0", "Case_1", None).unwrap_err();
        assert!(matches!(err, LgError::GraphLookup(_)));
        assert_eq!(proximity.live_workers(), 2);
        assert!(proximity.clone().signal("Case_0", "Case_1", None).is_failed());

        // Detached workers release their slots once the store answers
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while proximity.live_workers() > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(proximity.live_workers(), 0);
    }

    #[test]
    fn lookup_within_deadline_succeeds() {
        let proximity = GraphProximity::new(Arc::new(SlowGraph(Duration::from_millis(1))))
            .with_timeout(Duration::from_secs(5));
        let d = proximity.distance("Case_0", "Case_1", None).unwrap();
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let proximity = GraphProximity::new(memory_graph()).with_timeout(Duration::ZERO);
        assert!(proximity.timeout.is_none());
    }

    #[test]
    fn parallel_signals_keep_input_order() {
        let ids = ["Case_0", "nope", "Case_0", "Case_1"];
        let sequential = GraphProximity::new(memory_graph()).with_parallel(false);
        let parallel = GraphProximity::new(memory_graph()).with_parallel(true);

        let a = sequential.signals(&ids, "Case_1", None);
        let b = parallel.signals(&ids, "Case_1", None);
        assert_eq!(a, b);
        assert!(matches!(a[0], GraphSignal::Linked { .. }));
        assert_eq!(a[1], GraphSignal::Unlinked);
        assert_eq!(a[3], GraphSignal::Unlinked);
    }
}
