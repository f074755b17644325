//! Directory scanner for bulk indexing
//!
//! Produces a capped, extension-filtered list of candidate files:
//! - .gitignore and .codesenseignore rules are honored
//! - hidden files and directories are skipped
//! - directories named in `indexing.excluded_dirs` are never entered
//! - at most `indexing.max_files` paths are returned

use crate::Settings;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Walks directories to find source files to index
#[derive(Debug)]
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Walk `root` and return the files to index, in file-name order
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let config = &self.settings.indexing;
        let excluded = config.excluded_dirs.clone();
        let extensions: Vec<String> = config
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .add_custom_ignore_filename(".codesenseignore");
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| excluded.iter().any(|ex| ex == name)))
        });

        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|allowed| allowed == &ext.to_lowercase()))
            })
            .take(config.max_files)
            .collect()
    }

    /// Count files that would be indexed (useful for dry runs)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings_with(max_files: usize) -> Arc<Settings> {
        let mut settings = Settings::default();
        settings.indexing.max_files = max_files;
        Arc::new(settings)
    }

    #[test]
    fn test_walk_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("app.js"), "function app() {}").unwrap();
        fs::write(root.join("Tool.JAVA"), "class Tool {}").unwrap();
        fs::write(root.join("README.md"), "# Test").unwrap();
        fs::write(root.join("data.json"), "{}").unwrap();

        let files = FileWalker::new(settings_with(200)).walk(root);

        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|p| p.ends_with("main.rs")));
        assert!(files.iter().any(|p| p.ends_with("app.js")));
        assert!(files.iter().any(|p| p.ends_with("Tool.JAVA")));
    }

    #[test]
    fn test_excluded_and_hidden_dirs_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["node_modules/pkg", "dist", "build", ".cache", "src"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("dist/bundle.js"), "x").unwrap();
        fs::write(root.join("build/out.js"), "x").unwrap();
        fs::write(root.join(".cache/tmp.js"), "x").unwrap();
        fs::write(root.join(".hidden.js"), "x").unwrap();
        fs::write(root.join("src/app.js"), "x").unwrap();

        let files = FileWalker::new(settings_with(200)).walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/app.js"));
    }

    #[test]
    fn test_file_cap_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for i in 0..12 {
            fs::write(root.join(format!("f{i:02}.py")), "def f(): pass").unwrap();
        }

        let walker = FileWalker::new(settings_with(5));
        let files = walker.walk(root);

        assert_eq!(files.len(), 5);
        assert!(files[0].ends_with("f00.py"));
        assert_eq!(walker.count_files(root), 5);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join(".gitignore"), "ignored.rs\n").unwrap();
        fs::write(root.join("ignored.rs"), "fn ignored() {}").unwrap();
        fs::write(root.join("included.rs"), "fn included() {}").unwrap();

        let files = FileWalker::new(settings_with(200)).walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("included.rs"));
    }
}
