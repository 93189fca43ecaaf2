//! The memory and SQLite graphs must agree on every count.

use std::time::Duration;

use lexgraph::core::{Case, Section, SectionType};
use lexgraph::graph::{MemoryGraph, RelationGraph, SqliteGraph};
use lexgraph::storage::Database;
use tempfile::tempdir;

/// (case, edge section, edge type) links added after the owners' sections
const LINKS: &[(&str, &str, &str)] = &[
    // Mistyped on purpose: the section is Facts, the edge says Issues
    ("Case_1", "Case_0_Facts", "Issues"),
    ("Case_2", "Case_0_Issues", "Issues"),
    ("Case_2", "Case_1_Facts", "Facts"),
];

fn cases() -> Vec<(Case, Vec<Section>)> {
    let mut out = Vec::new();
    for idx in 0..3 {
        let case = Case::new(format!("Case_{idx}"), format!("Matter {idx}"));
        let sections = vec![
            case.section(SectionType::Facts, "facts"),
            case.section(SectionType::Issues, "issues"),
        ];
        out.push((case, sections));
    }
    out
}

#[test]
fn memory_and_sqlite_graphs_count_the_same() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lexgraph.db");
    let data = cases();

    let db = Database::open(&path).unwrap();
    db.write_cases(&data).unwrap();
    // Each case owns one section per type, so raw links go straight to the table
    let mut stmt = db
        .conn()
        .prepare("INSERT INTO has_section (case_id, section_id, section_type) VALUES (?, ?, ?)")
        .unwrap();
    for (case_id, section_id, edge_type) in LINKS {
        stmt.execute([*case_id, *section_id, *edge_type]).unwrap();
    }
    drop(stmt);
    drop(db);
    let sqlite = SqliteGraph::new(&path).with_busy_timeout(Duration::from_millis(500));

    let memory = MemoryGraph::from_cases(data.iter().map(|(c, s)| (c, s.as_slice()))).unwrap();
    for (case_id, section_id, edge_type) in LINKS {
        memory.add_edge(case_id, section_id, edge_type).unwrap();
    }

    let ids = ["Case_0", "Case_1", "Case_2", "Case_9"];
    for a in ids {
        for b in ids {
            for filter in [None, Some("Facts"), Some("Issues"), Some("Conclusion")] {
                let expected = sqlite.count_shared_sections(a, b, filter).unwrap();
                let actual = memory.count_shared_sections(a, b, filter).unwrap();
                assert_eq!(actual, expected, "{a}~{b} filter {filter:?}");
                assert_eq!(
                    memory.count_shared_sections(b, a, filter).unwrap(),
                    actual,
                    "{b}~{a} filter {filter:?}"
                );
            }
        }
    }

    // The mistyped edge counts under the section's own label
    assert_eq!(memory.count_shared_sections("Case_1", "Case_0", Some("Facts")).unwrap(), 1);
    assert_eq!(memory.count_shared_sections("Case_1", "Case_0", Some("Issues")).unwrap(), 0);
}
