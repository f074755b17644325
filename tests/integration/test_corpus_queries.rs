//! Corpus-wide queries: architectural overview, relationships, pattern index

use crate::common::{TestProject, sample_code};
use codesense::{Direction, RelationKind, SearchOptions};
use std::sync::atomic::AtomicBool;

fn indexed_project() -> (TestProject, codesense::CodeIndexer) {
    let project = TestProject::new();
    project.add_file("src/shapes.ts", sample_code::TS_SHAPES);
    project.add_file("src/renderer.ts", "export class Renderer { draw() {} }\n");
    project.add_file("svc/service.py", sample_code::PY_SERVICE);
    project.add_file("Registry.java", sample_code::JAVA_SINGLETON);
    let indexer = project.indexer();
    indexer
        .index_directory(project.path(), &AtomicBool::new(false))
        .unwrap();
    (project, indexer)
}

#[test]
fn test_overview_on_empty_corpus() {
    let project = TestProject::new();
    let indexer = project.indexer();
    assert!(indexer.architectural_overview().unwrap().is_empty());
    assert!(
        indexer
            .related_files(&project.path().join("nothing.js"), None)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_overview_aggregates_patterns() {
    let (_project, indexer) = indexed_project();
    let overview = indexer.architectural_overview().unwrap();
    let names: Vec<_> = overview.iter().map(|p| p.name.as_str()).collect();

    assert!(names.contains(&"Strategy"));
    assert!(names.contains(&"Observer"));
    assert!(names.contains(&"Singleton"));

    let singleton = overview.iter().find(|p| p.name == "Singleton").unwrap();
    assert_eq!(singleton.count, 1);
    assert_eq!(singleton.files, vec!["Registry.java"]);

    // Sorted by occurrence count, highest first
    assert!(overview.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn test_related_both_directions() {
    let (project, indexer) = indexed_project();

    let outgoing = indexer
        .related_files(&project.path().join("src/shapes.ts"), None)
        .unwrap();
    let implementations: Vec<_> = outgoing
        .iter()
        .filter(|r| r.kind == RelationKind::Implementation)
        .collect();
    assert_eq!(implementations.len(), 2);
    assert!(implementations.iter().all(|r| r.file == "Shape"));
    // Strongest edges first
    assert!(outgoing.windows(2).all(|w| w[0].strength >= w[1].strength));
    assert_eq!(outgoing.last().unwrap().kind, RelationKind::Import);

    let python = indexer
        .related_files(
            &project.path().join("svc/service.py"),
            Some(&[RelationKind::Inheritance]),
        )
        .unwrap();
    let bases: Vec<_> = python.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(bases, vec!["Base", "Mixin"]);
    assert!(python.iter().all(|r| r.direction == Direction::Outgoing));
}

#[test]
fn test_pattern_index_fed_during_scan() {
    let (_project, indexer) = indexed_project();
    let store = indexer.store();

    let area = store.find_patterns(Some("function"), "area", 10).unwrap();
    assert_eq!(area.len(), 1);
    assert_eq!(area[0].frequency, 2);
    assert_eq!(area[0].file_paths, vec!["src/shapes.ts"]);

    let classes = store.find_patterns(Some("class"), "", 100).unwrap();
    let names: Vec<_> = classes.iter().map(|c| c.pattern_content.as_str()).collect();
    for expected in ["Square", "Circle", "Renderer", "Service", "Registry"] {
        assert!(names.contains(&expected), "missing class {expected}");
    }

    let singleton = store
        .find_patterns(Some("design-pattern"), "singleton", 10)
        .unwrap();
    assert_eq!(singleton.len(), 1);
}

#[test]
fn test_similarity_boosts_stay_in_range() {
    let (_project, indexer) = indexed_project();
    let options = SearchOptions::default()
        .with_language("typescript")
        .with_patterns(vec!["async".to_string(), "singleton".to_string()])
        .with_functions(vec!["area".to_string(), "draw".to_string()]);

    let hits = indexer
        .find_similar_code("class Triangle implements Shape { area() {} }", Some(10), &options)
        .unwrap();

    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.similarity)));
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}
