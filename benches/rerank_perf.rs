//! Criterion benchmarks for the query path.
//!
//! - hash_embedding: embedding cost by input size
//! - vector_search: brute-force nearest neighbours over the in-memory index
//! - rerank: score fusion and sorting of a candidate list
//! - graph_proximity: shared-section counting over the in-memory graph

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use lexgraph::core::{Case, SectionType};
use lexgraph::graph::{GraphProximity, GraphSignal, MemoryGraph};
use lexgraph::search::{
    Candidate, EmbeddingRecord, FusionWeights, HashEmbedder, SectionMetadata, VectorIndex,
    VectorStore, fuse_and_rank,
};

fn record(embedder: &HashEmbedder, idx: usize) -> EmbeddingRecord {
    let ty = SectionType::ALL[idx % SectionType::ALL.len()];
    let text = format!("case {idx} concerning penalty assessment appeal ground {}", idx % 37);
    let section_id = format!("Case_{idx}_{}", ty.label());
    EmbeddingRecord {
        section_id: section_id.clone(),
        vector: embedder.embed_text(&text),
        document: text.clone(),
        metadata: SectionMetadata {
            section_id,
            label: ty.label().to_string(),
            case_id: format!("Case_{idx}"),
            title: format!("Matter {idx}"),
            case_type: "Tax".to_string(),
            court: "High Court".to_string(),
            content: text,
        },
    }
}

// =============================================================================
// Hash Embedding Benchmarks
// =============================================================================

fn hash_embedding_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_embedding");
    let embedder = HashEmbedder::new(384);

    for size in [10, 100, 500] {
        let input: String = "judgment ".repeat(size);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("text_size", size), &input, |b, input| {
            b.iter(|| embedder.embed_text(black_box(input)));
        });
    }

    group.finish();
}

// =============================================================================
// Vector Search Benchmarks
// =============================================================================

fn vector_search_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_search");
    let embedder = HashEmbedder::new(384);
    let query = embedder.embed_text("penalty for concealment of income");

    for size in [100, 1000, 5000] {
        let index = VectorIndex::new(384);
        for idx in 0..size {
            let _ = index.upsert(record(&embedder, idx));
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("top_10", size), &index, |b, index| {
            b.iter(|| index.query(black_box(&query), 10));
        });
    }

    group.finish();
}

// =============================================================================
// Rerank Benchmarks
// =============================================================================

fn rerank_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerank");
    let weights = FusionWeights::default();

    for size in [10, 100, 1000] {
        let candidates: Vec<Candidate> = (0..size)
            .map(|idx| Candidate {
                case_id: format!("Case_{idx}"),
                label: "Facts".to_string(),
                section_id: format!("Case_{idx}_Facts"),
                title: String::new(),
                court: String::new(),
                case_type: String::new(),
                content: String::new(),
                similarity: 1.0 / (1.0 + (idx % 17) as f64),
            })
            .collect();
        let signals: Vec<GraphSignal> = (0..size)
            .map(|idx| match idx % 3 {
                0 => GraphSignal::Linked {
                    distance: 1.0 / (1.0 + (idx % 5) as f64),
                },
                1 => GraphSignal::Unlinked,
                _ => GraphSignal::Failed {
                    reason: "timeout".to_string(),
                },
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("fuse_and_rank", size),
            &(candidates, signals),
            |b, (candidates, signals)| {
                b.iter(|| fuse_and_rank(candidates.clone(), signals.clone(), black_box(weights)));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Graph Proximity Benchmarks
// =============================================================================

fn graph_proximity_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_proximity");

    let graph = MemoryGraph::new();
    let reference = Case::new("Case_ref", "Reference");
    graph.add_case(reference);
    for idx in 0..200 {
        let case = Case::new(format!("Case_{idx}"), format!("Matter {idx}"));
        let sections: Vec<_> = SectionType::ALL
            .into_iter()
            .map(|ty| case.section(ty, "text"))
            .collect();
        graph.add_case(case);
        for section in &sections {
            let _ = graph.add_section(section);
        }
        if idx % 4 == 0 {
            let _ = graph.add_edge("Case_ref", &format!("Case_{idx}_Facts"), "Facts");
        }
    }
    let graph = Arc::new(graph);
    let ids: Vec<String> = (0..200).map(|idx| format!("Case_{idx}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    for parallel in [false, true] {
        let proximity = GraphProximity::new(graph.clone()).with_parallel(parallel);
        group.bench_with_input(
            BenchmarkId::new("signals_200", if parallel { "parallel" } else { "serial" }),
            &id_refs,
            |b, ids| b.iter(|| proximity.signals(black_box(ids), "Case_ref", None)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    hash_embedding_benchmarks,
    vector_search_benchmarks,
    rerank_benchmarks,
    graph_proximity_benchmarks,
);
criterion_main!(benches);
