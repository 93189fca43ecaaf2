//! End-to-end retrieval over an ingested and indexed SQLite database.

use std::collections::HashMap;

use indicatif::ProgressBar;

use lexgraph::LgError;
use lexgraph::config::Config;
use lexgraph::graph::GraphSignal;
use lexgraph::ingest::{IndexOptions, build_graph, index_sections, load_cases};
use lexgraph::search::{
    DistanceMetric, Pipeline, QueryRequest, ScoreSource, SectionFilter, SqliteVectorStore,
    build_embedder,
};
use lexgraph::storage::Database;
use lexgraph::test_utils::fixtures::{CaseFixture, sample_records};
use lexgraph::test_utils::logging::TestLogger;

const TAX_QUERY: &str = "penalty for concealment of income rightly levied on the assessee";

fn ingested() -> CaseFixture {
    let fixture = CaseFixture::new();
    let input = fixture.create_cases("cases.jsonl", &sample_records());
    let loaded = load_cases(&input).unwrap();
    let db = Database::open(fixture.db_path()).unwrap();
    build_graph(&db, &loaded).unwrap();
    fixture
}

fn indexed() -> CaseFixture {
    let fixture = ingested();
    let config = Config::default();
    let db = Database::open(fixture.db_path()).unwrap();
    let embedder = build_embedder(&config.search).unwrap();
    let store = SqliteVectorStore::new(fixture.db_path(), embedder.dims(), DistanceMetric::L2)
        .with_embedder_type(embedder.name());
    let report = index_sections(
        &db,
        embedder.as_ref(),
        &store,
        IndexOptions::default(),
        &ProgressBar::hidden(),
    )
    .unwrap();
    assert_eq!(report.indexed, 9);
    assert_eq!(report.failed, 0);
    fixture
}

fn pipeline(fixture: &CaseFixture) -> Pipeline {
    Pipeline::open(&Config::default(), &fixture.db_path()).unwrap()
}

/// Section id to retrieval similarity, for checking fused scores.
fn similarities(pipeline: &Pipeline, text: &str) -> HashMap<String, f64> {
    pipeline
        .retriever()
        .retrieve(text, &SectionFilter::Any, 10)
        .unwrap()
        .into_iter()
        .map(|c| (c.section_id, c.similarity))
        .collect()
}

#[test]
fn free_text_query_ranks_on_semantics() {
    let log = TestLogger::new("free_text_query_ranks_on_semantics");
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    let results = pipeline.query(TAX_QUERY, None).unwrap();
    for (i, r) in results.iter().enumerate() {
        log.log_ranking(i + 1, &r.case_id, &r.label, r.score);
    }

    assert_eq!(results.len(), 9);
    assert_eq!(results[0].section_id, "Case_0_Issues");
    assert_eq!(results[0].title, "CIT v. Arora Traders");
    assert_eq!(results[0].court, "Delhi High Court");
    assert!(
        results
            .iter()
            .all(|r| r.source == ScoreSource::SemanticOnly && r.graph == GraphSignal::Unlinked)
    );
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

    let sims = similarities(&pipeline, TAX_QUERY);
    for r in &results {
        assert!((r.score - sims[&r.section_id]).abs() < 1e-9);
    }
    log.pass();
}

#[test]
fn wildcard_filter_keeps_every_label() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    for alias in ["any", "all", "*"] {
        let results = pipeline.query(TAX_QUERY, Some(alias)).unwrap();
        assert_eq!(results.len(), 9, "alias {alias}");
    }
    let results = pipeline.query(TAX_QUERY, Some("any")).unwrap();
    let mut labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(
        labels,
        vec!["Conclusion", "Facts", "Issues", "PetArg", "Precedent"]
    );
}

#[test]
fn label_filter_keeps_only_that_label() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    let results = pipeline.query(TAX_QUERY, Some("Issues")).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.label == "Issues"));
    assert_eq!(results[0].case_id, "Case_0");

    // Titles resolve to labels
    let by_title = pipeline.query(TAX_QUERY, Some("Issue")).unwrap();
    assert_eq!(by_title, results);
}

#[test]
fn absent_label_gives_no_results() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    let results = pipeline.query(TAX_QUERY, Some("CDiscource")).unwrap();
    assert!(results.is_empty());
}

#[test]
fn empty_index_gives_no_results() {
    let fixture = ingested();
    let pipeline = pipeline(&fixture);

    assert!(pipeline.retriever().retrieve(TAX_QUERY, &SectionFilter::Any, 10).unwrap().is_empty());
    assert!(pipeline.query(TAX_QUERY, None).unwrap().is_empty());
}

#[test]
fn blank_query_is_rejected() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    let err = pipeline.query("   ", None).unwrap_err();
    assert!(matches!(err, LgError::EmptyInput(_)));
}

#[test]
fn top_k_bounds_results() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);

    let results = pipeline
        .query_with(&QueryRequest::new(TAX_QUERY).top_k(4))
        .unwrap();
    assert_eq!(results.len(), 4);
    assert!(
        pipeline
            .query_with(&QueryRequest::new(TAX_QUERY).top_k(0))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn linked_reference_case_lifts_shared_case() {
    let log = TestLogger::new("linked_reference_case_lifts_shared_case");
    let fixture = indexed();
    {
        // Case_2 cites Case_0's conclusion
        let db = Database::open(fixture.db_path()).unwrap();
        db.conn()
            .execute(
                "INSERT INTO has_section (case_id, section_id, section_type)
                 VALUES ('Case_2', 'Case_0_Conclusion', 'Conclusion')",
                [],
            )
            .unwrap();
    }
    let pipeline = pipeline(&fixture);
    let sims = similarities(&pipeline, TAX_QUERY);

    let request = QueryRequest::new(TAX_QUERY).reference_case("Case_2");
    let results = pipeline.query_with(&request).unwrap();
    for (i, r) in results.iter().enumerate() {
        log.log_ranking(i + 1, &r.case_id, &r.label, r.score);
    }
    assert_eq!(results.len(), 9);

    for r in &results {
        let sim = sims[&r.section_id];
        if r.case_id == "Case_0" {
            // One shared section: distance 1/2, structural 2/3
            assert_eq!(r.graph, GraphSignal::Linked { distance: 0.5 });
            assert_eq!(r.source, ScoreSource::Hybrid);
            let expected = 0.7f64.mul_add(sim, 0.3 * (2.0 / 3.0));
            assert!((r.score - expected).abs() < 1e-9);
        } else {
            // Case_2 against itself shares no distinct edge pair
            assert_eq!(r.graph, GraphSignal::Unlinked);
            assert!((r.score - sim).abs() < 1e-9);
        }
    }
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

    // The section-type filter restricts which shared sections count
    let facts = pipeline
        .query_with(&request.clone().section("Facts"))
        .unwrap();
    assert!(facts.iter().all(|r| r.graph == GraphSignal::Unlinked));
    let conclusions = pipeline
        .query_with(&request.section("Conclusion"))
        .unwrap();
    assert_eq!(conclusions.len(), 1);
    assert_eq!(conclusions[0].source, ScoreSource::Hybrid);
    log.pass();
}

#[test]
fn missing_graph_degrades_to_semantic_scores() {
    let fixture = indexed();
    let pipeline = pipeline(&fixture);
    let sims = similarities(&pipeline, TAX_QUERY);

    // Unknown reference ids are a lookup miss, not a failure
    let results = pipeline
        .query_with(&QueryRequest::new(TAX_QUERY).reference_case("Case_404"))
        .unwrap();
    assert!(results.iter().all(|r| r.source == ScoreSource::SemanticOnly));
    for r in &results {
        assert!((r.score - sims[&r.section_id]).abs() < 1e-9);
    }
}

#[test]
fn reindexing_reuses_unchanged_vectors() {
    let fixture = indexed();
    let config = Config::default();
    let db = Database::open(fixture.db_path()).unwrap();
    let embedder = build_embedder(&config.search).unwrap();
    let store = SqliteVectorStore::new(fixture.db_path(), embedder.dims(), DistanceMetric::L2)
        .with_embedder_type(embedder.name());

    let report = index_sections(
        &db,
        embedder.as_ref(),
        &store,
        IndexOptions::default(),
        &ProgressBar::hidden(),
    )
    .unwrap();
    assert_eq!(report.unchanged, 9);
    assert_eq!(report.indexed, 0);

    let forced = index_sections(
        &db,
        embedder.as_ref(),
        &store,
        IndexOptions {
            skip_unchanged: false,
        },
        &ProgressBar::hidden(),
    )
    .unwrap();
    assert_eq!(forced.indexed, 9);
}
