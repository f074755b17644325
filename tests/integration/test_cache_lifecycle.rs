//! Content-hash cache behavior end to end: hit, supersede, evict, reopen

use crate::common::{TestProject, sample_code::FOO_EXTENDS_BAR};
use codesense::{FileEvent, RelationKind, SearchOptions, calculate_hash};

#[test]
fn test_identical_content_is_one_row() {
    let project = TestProject::new();
    let indexer = project.indexer();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);

    let first = indexer.index_file(&path).unwrap();
    let second = indexer.index_file(&path).unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.record.content_hash(), calculate_hash(FOO_EXTENDS_BAR));
    assert_eq!(first.record.content_hash(), second.record.content_hash());
    assert_eq!(
        first.record.embedding.embedding.to_bytes(),
        second.record.embedding.embedding.to_bytes()
    );
    assert_eq!(indexer.stats().unwrap().total_files, 1);
}

#[test]
fn test_one_character_change_supersedes_row() {
    let project = TestProject::new();
    let indexer = project.indexer();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);
    let old = indexer.index_file(&path).unwrap();

    let edited = FOO_EXTENDS_BAR.replace("Bar", "Baz");
    project.add_file("foo.js", &edited);
    let new = indexer.index_file(&path).unwrap();

    assert!(!new.cached);
    assert_ne!(old.record.content_hash(), new.record.content_hash());

    let stored = indexer.store().get("foo.js").unwrap().unwrap();
    assert_eq!(stored.content_hash(), calculate_hash(&edited));
    assert_eq!(indexer.stats().unwrap().total_files, 1);

    // Only the new superclass remains in the graph
    let related = indexer
        .related_files(&path, Some(&[RelationKind::Inheritance]))
        .unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].file, "Baz");
}

#[test]
fn test_inheritance_edge_for_foo_extends_bar() {
    let project = TestProject::new();
    let indexer = project.indexer();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);
    let analyzed = indexer.index_file(&path).unwrap();

    let ast = analyzed.record.ast.unwrap();
    assert_eq!(ast.relationships.len(), 1);
    let edge = &ast.relationships[0];
    assert_eq!(edge.source, "foo.js");
    assert_eq!(edge.target, "Bar");
    assert_eq!(edge.kind, RelationKind::Inheritance);
    assert_eq!(edge.strength, 0.9);
}

#[test]
fn test_self_similarity_ranks_first() {
    let project = TestProject::new();
    let indexer = project.indexer();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);
    indexer.index_file(&path).unwrap();

    let hits = indexer
        .find_similar_code(FOO_EXTENDS_BAR, Some(5), &SearchOptions::default())
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.path, "foo.js");
    assert!((hits[0].cosine - 1.0).abs() < 1e-5);
    assert!((hits[0].similarity - 1.0).abs() < 1e-5);
}

#[test]
fn test_change_event_forces_recompute() {
    let project = TestProject::new();
    let indexer = project.indexer();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);
    indexer.index_file(&path).unwrap();

    assert!(indexer.handle_event(&FileEvent::Changed(path.clone())).unwrap());
    assert!(indexer.store().get("foo.js").unwrap().is_none());

    // Next request recomputes even though the content is the same
    let again = indexer.index_file(&path).unwrap();
    assert!(!again.cached);
}

#[test]
fn test_cache_survives_reopen() {
    let project = TestProject::new();
    let path = project.add_file("foo.js", FOO_EXTENDS_BAR);

    {
        let indexer = project.indexer();
        indexer.index_file(&path).unwrap();
    }

    let indexer = project.indexer();
    let analyzed = indexer.index_file(&path).unwrap();
    assert!(analyzed.cached);
    assert_eq!(analyzed.record.embedding.language, "javascript");
}
