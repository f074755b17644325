pub mod file_info;
pub mod fs_watcher;
pub mod indexer;
pub mod progress;
pub mod walker;

pub use file_info::{calculate_hash, truncate_chars};
pub use fs_watcher::{Debouncer, FileEvent, FileSystemWatcher, FileWatchError, classify_event};
pub use indexer::{AnalyzedFile, CodeIndexer};
pub use progress::IndexStats;
pub use walker::FileWalker;
