//! Bulk indexing: allow-list, exclusions, cap, batching and cancellation

use crate::common::TestProject;
use codesense::IndexError;
use std::sync::atomic::AtomicBool;

#[test]
fn test_scan_respects_cap_and_allow_list() {
    let project = TestProject::new();
    for i in 0..30 {
        project.add_file(&format!("src/mod{i:02}.ts"), &format!("export function f{i}() {{}}"));
    }
    project.add_file("docs/guide.md", "# guide");
    project.add_file("assets/logo.svg", "<svg/>");
    project.add_file("node_modules/lib/index.js", "module.exports = 1;");
    project.add_file(".cache/tmp.js", "var x = 1;");

    let mut settings = project.settings();
    settings.indexing.max_files = 12;
    let indexer = project.indexer_with(settings);

    let stats = indexer
        .index_directory(project.path(), &AtomicBool::new(false))
        .unwrap();

    assert_eq!(stats.scanned, 12);
    assert_eq!(stats.indexed, 12);

    let store_stats = indexer.stats().unwrap();
    assert_eq!(store_stats.total_files, 12);
    assert_eq!(store_stats.languages.get("typescript"), Some(&12));
    assert!(
        indexer
            .store()
            .all_embeddings()
            .unwrap()
            .iter()
            .all(|r| r.path.starts_with("src/") && r.path.ends_with(".ts"))
    );
}

#[test]
fn test_mixed_languages_and_rescan() {
    let project = TestProject::new();
    project.add_file("app.js", "function main() { return run(); }");
    project.add_file("svc/service.py", crate::common::sample_code::PY_SERVICE);
    project.add_file("Registry.java", crate::common::sample_code::JAVA_SINGLETON);
    project.add_file("native/buf.cpp", "#include <vector>\nclass Buf { int size; };\n");
    project.add_file("cmd/main.go", "package main\nfunc main() {}\n");
    project.add_file("lib.rs", "fn helper() -> u32 { 1 }\n");

    let indexer = project.indexer();
    let cancel = AtomicBool::new(false);

    let first = indexer.index_directory(project.path(), &cancel).unwrap();
    assert_eq!(first.scanned, 6);
    assert_eq!(first.indexed, 6);
    assert_eq!(first.failed, 0);

    let second = indexer.index_directory(project.path(), &cancel).unwrap();
    assert_eq!(second.cached, 6);
    assert_eq!(second.indexed, 0);

    let languages = indexer.stats().unwrap().languages;
    for tag in ["javascript", "python", "java", "cpp", "go", "rust"] {
        assert_eq!(languages.get(tag), Some(&1), "missing {tag}");
    }
}

#[test]
fn test_cancelled_scan_writes_nothing() {
    let project = TestProject::new();
    project.add_file("a.js", "function a() {}");
    project.add_file("b.js", "function b() {}");
    let indexer = project.indexer();

    let err = indexer
        .index_directory(project.path(), &AtomicBool::new(true))
        .unwrap_err();

    assert_eq!(err.status_code(), "CANCELLED");
    assert!(matches!(err, IndexError::Cancelled { total: 2, .. }));
    assert_eq!(indexer.stats().unwrap().total_files, 0);
}

#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    let project = TestProject::new();
    project.add_file("good.js", "function good() {}");
    // Invalid UTF-8 cannot be read as text
    std::fs::write(project.path().join("bad.js"), [0xff, 0xfe, 0xfd]).unwrap();

    let indexer = project.indexer();
    let stats = indexer
        .index_directory(project.path(), &AtomicBool::new(false))
        .unwrap();

    assert_eq!(stats.indexed, 1);
    assert_eq!(stats.failed, 1);
    assert!(stats.errors[0].0.ends_with("bad.js"));
}
