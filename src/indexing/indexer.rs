//! Indexer driver
//!
//! Ties the pipeline together: classify, extract, detect, relate, embed and
//! persist. Single files go through [`CodeIndexer::analyze_file`]; whole
//! trees go through [`CodeIndexer::index_directory`], which works in fixed
//! size batches with parallel analysis inside a batch and sequential store
//! writes.

use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::fs_watcher::FileEvent;
use super::progress::IndexStats;
use super::walker::FileWalker;
use super::{calculate_hash, truncate_chars};
use crate::analysis::{FileAnalysis, FileMetadata, PatternOccurrence, summarize_patterns};
use crate::config::Settings;
use crate::error::{ErrorContext, IndexError, IndexResult};
use crate::parsing::{Language, get_registry};
use crate::relationship::{RelatedFile, RelationKind};
use crate::storage::{CodeStore, EmbeddingRecord, FileEntry, StoreStats, StoredFile};
use crate::vector::{FallbackEmbedder, ScoredMatch, SearchOptions, rank};

/// Result of a single-file analysis
#[derive(Debug, Clone)]
pub struct AnalyzedFile {
    pub record: StoredFile,
    /// True when the content hash matched and nothing was recomputed
    pub cached: bool,
}

/// What the parallel phase of a batch produced for one path
enum Prepared {
    Entry(Box<FileEntry>),
    Cached,
    Unsupported,
    Failed(String),
}

pub struct CodeIndexer {
    settings: Arc<Settings>,
    store: CodeStore,
    embedder: FallbackEmbedder,
    pool: rayon::ThreadPool,
}

impl CodeIndexer {
    /// Open the configured database and load the configured embedder
    pub fn new(settings: Arc<Settings>) -> IndexResult<Self> {
        let store = CodeStore::open(settings.resolved_database_path())?;
        let embedder = FallbackEmbedder::from_config(&settings.embedding);
        Self::with_components(settings, store, embedder)
    }

    pub fn with_components(
        settings: Arc<Settings>,
        store: CodeStore,
        embedder: FallbackEmbedder,
    ) -> IndexResult<Self> {
        let threads = settings.indexing.parallel_threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("codesense-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;

        Ok(Self {
            settings,
            store,
            embedder,
            pool,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &CodeStore {
        &self.store
    }

    pub fn embedder(&self) -> &FallbackEmbedder {
        &self.embedder
    }

    /// Store key for `path`: relative to the workspace root when under it
    pub fn path_key(&self, path: &Path) -> String {
        let relative = self
            .settings
            .workspace_root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative.to_string_lossy().into_owned()
    }

    /// Analyze one file whose content the caller already holds.
    ///
    /// Unrecognized extensions fail with [`IndexError::UnsupportedLanguage`].
    /// When the stored hash equals the content's hash the cached record is
    /// returned and nothing is recomputed or written.
    pub fn analyze_file(&self, path: &Path, content: &str) -> IndexResult<AnalyzedFile> {
        let language =
            Language::from_path(path).ok_or_else(|| IndexError::UnsupportedLanguage {
                path: path.to_path_buf(),
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string(),
            })?;

        let key = self.path_key(path);
        let hash = calculate_hash(content);

        if self.store.content_hash(&key)?.as_deref() == Some(hash.as_str()) {
            if let Some(record) = self.store.get(&key)? {
                debug!("Cache hit for {key}");
                return Ok(AnalyzedFile {
                    record,
                    cached: true,
                });
            }
        }

        let entry = self.build_entry(key.clone(), language, content, hash);
        self.persist(&entry)?;

        let record = self.store.get(&key)?.ok_or_else(|| {
            IndexError::General(format!("Cached row for '{key}' vanished after write"))
        })?;
        Ok(AnalyzedFile {
            record,
            cached: false,
        })
    }

    /// Read `path` from disk, then [`analyze_file`](Self::analyze_file)
    pub fn index_file(&self, path: impl AsRef<Path>) -> IndexResult<AnalyzedFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.analyze_file(path, &content)
    }

    pub fn index_directory(&self, root: &Path, cancel: &AtomicBool) -> IndexResult<IndexStats> {
        self.index_directory_with_progress(root, cancel, |_, _| {})
    }

    /// Scan `root` and index every candidate in fixed-size batches.
    ///
    /// `on_batch(processed, total)` runs after each batch. `cancel` is
    /// checked before each batch; a file already being analyzed finishes.
    pub fn index_directory_with_progress(
        &self,
        root: &Path,
        cancel: &AtomicBool,
        mut on_batch: impl FnMut(usize, usize),
    ) -> IndexResult<IndexStats> {
        let mut stats = IndexStats::new();
        let files = FileWalker::new(Arc::clone(&self.settings)).walk(root);
        stats.scanned = files.len();
        info!("Indexing {} files under {}", files.len(), root.display());

        let batch_size = self.settings.indexing.batch_size.max(1);
        let pause = Duration::from_millis(self.settings.indexing.batch_pause_ms);

        for (i, batch) in files.chunks(batch_size).enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!("Indexing cancelled after {} files", stats.processed());
                return Err(IndexError::Cancelled {
                    completed: stats.processed(),
                    total: stats.scanned,
                });
            }
            if i > 0 && !pause.is_zero() {
                std::thread::sleep(pause);
            }

            let prepared: Vec<(PathBuf, Prepared)> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|path| (path.clone(), self.prepare_guarded(path)))
                    .collect()
            });

            for (path, outcome) in prepared {
                match outcome {
                    // Store failures abort the scan; analysis failures only skip a file
                    Prepared::Entry(entry) => {
                        self.persist(&entry)?;
                        stats.indexed += 1;
                    }
                    Prepared::Cached => stats.cached += 1,
                    Prepared::Unsupported => {
                        debug!("Skipping {} (unsupported language)", path.display());
                        stats.skipped += 1;
                    }
                    Prepared::Failed(reason) => {
                        warn!("Skipping {}: {reason}", path.display());
                        stats.add_error(path, reason);
                    }
                }
            }

            on_batch(stats.processed(), stats.scanned);
            debug!(
                "Batch {} done: {}/{} files",
                i + 1,
                stats.processed(),
                stats.scanned
            );
        }

        stats.stop_timing();
        info!(
            "Indexed {} files ({} cached, {} skipped, {} failed) in {:.2}s",
            stats.indexed,
            stats.cached,
            stats.skipped,
            stats.failed,
            stats.elapsed.as_secs_f64()
        );
        Ok(stats)
    }

    /// React to a file-system change.
    ///
    /// Changes and deletions evict the cached rows so the next request
    /// recomputes them; creations wait for the first request. Returns
    /// whether anything was evicted.
    pub fn handle_event(&self, event: &FileEvent) -> IndexResult<bool> {
        match event {
            FileEvent::Created(path) => {
                debug!("Ignoring creation of {}", path.display());
                Ok(false)
            }
            FileEvent::Changed(path) | FileEvent::Deleted(path) => {
                Ok(self.store.remove(&self.path_key(path))?)
            }
        }
    }

    /// Drop a file from the cache
    pub fn forget(&self, path: &Path) -> IndexResult<bool> {
        Ok(self.store.remove(&self.path_key(path))?)
    }

    /// Rank cached files by similarity to `text`.
    /// `limit` defaults to `search.default_limit`.
    pub fn find_similar_code(
        &self,
        text: &str,
        limit: Option<usize>,
        options: &SearchOptions,
    ) -> IndexResult<Vec<ScoredMatch<EmbeddingRecord>>> {
        let query = self
            .embedder
            .embed(truncate_chars(text, self.settings.embedding.max_input_chars));
        let candidates = self.store.all_embeddings()?;
        let limit = limit.unwrap_or(self.settings.search.default_limit);
        debug!(
            "Ranking {} cached embeddings against a {} query",
            candidates.len(),
            query.model_type
        );
        Ok(rank(&query, candidates, limit, options))
    }

    /// Edges touching `path`. `kinds` defaults to `search.related_types`.
    pub fn related_files(
        &self,
        path: &Path,
        kinds: Option<&[RelationKind]>,
    ) -> IndexResult<Vec<RelatedFile>> {
        let key = self.path_key(path);
        match kinds {
            Some(kinds) => Ok(self.store.related_to(&key, kinds)?),
            None => {
                let kinds = self.default_related_types()?;
                Ok(self.store.related_to(&key, &kinds)?)
            }
        }
    }

    /// Pattern names across the corpus, most frequent first
    pub fn architectural_overview(&self) -> IndexResult<Vec<PatternOccurrence>> {
        let per_file = self.store.all_architectural_patterns()?;
        Ok(summarize_patterns(
            per_file
                .iter()
                .map(|(path, patterns)| (path.as_str(), patterns.as_slice())),
        ))
    }

    pub fn stats(&self) -> IndexResult<StoreStats> {
        Ok(self.store.stats()?)
    }

    fn default_related_types(&self) -> IndexResult<Vec<RelationKind>> {
        self.settings
            .search
            .related_types
            .iter()
            .map(|name| {
                RelationKind::from_str(name).map_err(|reason| IndexError::ConfigError {
                    reason: format!("search.related_types: {reason}: '{name}'"),
                })
            })
            .collect()
    }

    /// [`prepare`](Self::prepare), with a panic turned into a per-file failure
    fn prepare_guarded(&self, path: &Path) -> Prepared {
        catch_unwind(AssertUnwindSafe(|| self.prepare(path))).unwrap_or_else(|_| {
            Prepared::Failed(format!("Analysis panicked for {}", path.display()))
        })
    }

    /// Parallel phase of a batch: everything except the store write
    fn prepare(&self, path: &Path) -> Prepared {
        let Some(language) = Language::from_path(path) else {
            return Prepared::Unsupported;
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return Prepared::Failed(format!("Failed to read file: {e}")),
        };

        let key = self.path_key(path);
        let hash = calculate_hash(&content);
        match self.store.content_hash(&key) {
            Ok(Some(stored)) if stored == hash => return Prepared::Cached,
            Ok(_) => {}
            Err(e) => return Prepared::Failed(e.to_string()),
        }

        let entry = self.build_entry(key, language, &content, hash);
        if entry.analysis.is_none() {
            let error = IndexError::Extraction {
                path: path.to_path_buf(),
                language: language.name().to_string(),
                reason: entry.metadata.ast.error.unwrap_or_default(),
            };
            return Prepared::Failed(error.to_string());
        }
        Prepared::Entry(Box::new(entry))
    }

    /// Extract, analyze and embed. Extraction failure degrades to an
    /// embedding-only entry with the reason recorded in the metadata.
    fn build_entry(&self, key: String, language: Language, content: &str, hash: String) -> FileEntry {
        let analysis = match get_registry().extract(content, language) {
            Ok(description) => Ok(FileAnalysis::from_description(&key, content, description)),
            Err(e) => {
                warn!("Structural extraction failed for {key}: {e}");
                Err(e.to_string())
            }
        };
        let metadata = FileMetadata::build(
            content,
            language,
            analysis.as_ref().map_err(String::as_str),
        );
        let embedding = self
            .embedder
            .embed(truncate_chars(content, self.settings.embedding.max_input_chars));

        FileEntry {
            path: key,
            content_hash: hash,
            language: language.tag().to_string(),
            file_size: content.len() as u64,
            embedding,
            metadata,
            analysis: analysis.ok(),
        }
    }

    /// Write the entry, then feed the code-pattern index if anything changed
    fn persist(&self, entry: &FileEntry) -> IndexResult<()> {
        let outcome = self.store.upsert(entry)?;
        if !outcome.wrote() {
            return Ok(());
        }
        debug!("Stored {} ({outcome:?})", entry.path);

        for tag in &entry.metadata.patterns {
            self.store.record_pattern("design-pattern", tag, &entry.path)?;
        }
        if let Some(analysis) = &entry.analysis {
            let desc = &analysis.description;
            for name in desc
                .function_names()
                .chain(desc.methods().map(|m| m.name.as_str()))
            {
                self.store.record_pattern("function", name, &entry.path)?;
            }
            for class in &desc.classes {
                self.store.record_pattern("class", &class.name, &entry.path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn indexer_for(root: &Path) -> CodeIndexer {
        let mut settings = Settings::default();
        settings.workspace_root = Some(root.to_path_buf());
        settings.indexing.batch_pause_ms = 0;
        settings.indexing.parallel_threads = 2;
        CodeIndexer::with_components(
            Arc::new(settings),
            CodeStore::open_in_memory().unwrap(),
            FallbackEmbedder::heuristic_only(),
        )
        .unwrap()
    }

    #[test]
    fn test_analyze_file_caches_by_hash() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        let path = temp.path().join("foo.js");
        let content = "class Foo extends Bar { getInstance() {} }";

        let first = indexer.analyze_file(&path, content).unwrap();
        assert!(!first.cached);
        assert_eq!(first.record.path(), "foo.js");

        let second = indexer.analyze_file(&path, content).unwrap();
        assert!(second.cached);
        assert_eq!(
            second.record.embedding.embedding.to_bytes(),
            first.record.embedding.embedding.to_bytes()
        );
        assert_eq!(indexer.stats().unwrap().total_files, 1);
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());

        let err = indexer
            .analyze_file(&temp.path().join("notes.xyz"), "hello")
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::UnsupportedLanguage { ref extension, .. } if extension == "xyz"
        ));
    }

    #[test]
    fn test_index_file_missing_is_read_error() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        let err = indexer.index_file(temp.path().join("gone.py")).unwrap_err();
        assert!(matches!(err, IndexError::FileRead { .. }));
    }

    #[test]
    fn test_index_directory_counts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.js"), "function a() { return 1; }").unwrap();
        fs::write(root.join("b.py"), "class B(Base):\n    def run(self):\n        pass\n").unwrap();
        fs::write(root.join("c.go"), "func main() {}").unwrap();
        fs::write(root.join("notes.md"), "# not code").unwrap();

        let indexer = indexer_for(root);
        let cancel = AtomicBool::new(false);

        let stats = indexer.index_directory(root, &cancel).unwrap();
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.indexed, 3);
        assert_eq!(stats.failed, 0);

        // Second pass hits the cache for everything
        let again = indexer.index_directory(root, &cancel).unwrap();
        assert_eq!(again.cached, 3);
        assert_eq!(again.indexed, 0);

        // Only the edited file is recomputed
        fs::write(root.join("a.js"), "function a() { return 2; }").unwrap();
        let edited = indexer.index_directory(root, &cancel).unwrap();
        assert_eq!(edited.indexed, 1);
        assert_eq!(edited.cached, 2);
    }

    #[test]
    fn test_index_directory_unicode_whitespace_params() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join("math.c"),
            "int add(int\u{00A0}a, int b) {\n    return a + b;\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("Calc.java"),
            "public class Calc {\n    public int twice(int\u{3000}x) { return x * 2; }\n}\n",
        )
        .unwrap();
        fs::write(root.join("ok.js"), "function ok() { return 1; }").unwrap();

        let indexer = indexer_for(root);
        let stats = indexer
            .index_directory(root, &AtomicBool::new(false))
            .unwrap();
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.indexed, 3);
        assert_eq!(stats.failed, 0);

        let record = indexer.store().get("math.c").unwrap().unwrap();
        let ast = record.ast.unwrap();
        let add = &ast.ast.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.parameters[0].name, "a");
        assert_eq!(add.parameters[0].type_name.as_deref(), Some("int"));
    }

    #[test]
    fn test_index_directory_cancelled_before_first_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "function a() {}").unwrap();
        let indexer = indexer_for(temp.path());

        let cancel = AtomicBool::new(true);
        let err = indexer.index_directory(temp.path(), &cancel).unwrap_err();
        assert!(matches!(
            err,
            IndexError::Cancelled {
                completed: 0,
                total: 1
            }
        ));
        assert_eq!(indexer.stats().unwrap().total_files, 0);
    }

    #[test]
    fn test_progress_reported_per_batch() {
        let temp = TempDir::new().unwrap();
        for i in 0..7 {
            fs::write(temp.path().join(format!("f{i}.js")), format!("function f{i}() {{}}")).unwrap();
        }
        let indexer = indexer_for(temp.path());

        let mut calls = Vec::new();
        indexer
            .index_directory_with_progress(temp.path(), &AtomicBool::new(false), |done, total| {
                calls.push((done, total))
            })
            .unwrap();
        // Default batch size is 5
        assert_eq!(calls, vec![(5, 7), (7, 7)]);
    }

    #[test]
    fn test_handle_event_evicts() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        let path = temp.path().join("foo.js");
        indexer.analyze_file(&path, "function foo() {}").unwrap();

        assert!(!indexer.handle_event(&FileEvent::Created(path.clone())).unwrap());
        assert!(indexer.store().get("foo.js").unwrap().is_some());

        assert!(indexer.handle_event(&FileEvent::Changed(path.clone())).unwrap());
        assert!(indexer.store().get("foo.js").unwrap().is_none());
        assert!(!indexer.handle_event(&FileEvent::Deleted(path)).unwrap());
    }

    #[test]
    fn test_patterns_recorded() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        let content = r#"class Loader {
    async load() { await fetch('/api'); }
}
function createLoader() { return new Loader(); }
"#;
        indexer
            .analyze_file(&temp.path().join("loader.js"), content)
            .unwrap();

        let store = indexer.store();
        assert_eq!(store.find_patterns(Some("class"), "Loader", 5).unwrap().len(), 1);
        assert_eq!(store.find_patterns(Some("function"), "createLoader", 5).unwrap().len(), 1);
        assert_eq!(store.find_patterns(Some("function"), "oad", 5).unwrap().len(), 2);
        assert!(
            !store
                .find_patterns(Some("design-pattern"), "async", 5)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_find_similar_self_match() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        let content = "class Foo extends Bar { getInstance() {} }";
        indexer
            .analyze_file(&temp.path().join("foo.js"), content)
            .unwrap();

        let hits = indexer
            .find_similar_code(content, None, &SearchOptions::default())
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item.path, "foo.js");
        assert!((hits[0].cosine - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_files_default_types() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        indexer
            .analyze_file(
                &temp.path().join("foo.js"),
                "import { Bar } from './bar';\nclass Foo extends Bar {}\n",
            )
            .unwrap();

        let related = indexer
            .related_files(&temp.path().join("foo.js"), None)
            .unwrap();
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].kind, RelationKind::Inheritance);
        assert_eq!(related[0].file, "Bar");

        let imports = indexer
            .related_files(&temp.path().join("foo.js"), Some(&[RelationKind::Import]))
            .unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].file, "./bar");
    }

    #[test]
    fn test_overview_on_empty_store() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        assert!(indexer.architectural_overview().unwrap().is_empty());
    }

    #[test]
    fn test_overview_counts_across_files() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_for(temp.path());
        for name in ["a.js", "b.js"] {
            indexer
                .analyze_file(
                    &temp.path().join(name),
                    &format!("class {}Factory {{ createThing() {{}} }}", &name[..1]),
                )
                .unwrap();
        }

        let overview = indexer.architectural_overview().unwrap();
        let factory = overview.iter().find(|p| p.name == "Factory").unwrap();
        assert_eq!(factory.count, 2);
        assert_eq!(factory.files, vec!["a.js", "b.js"]);
    }
}
