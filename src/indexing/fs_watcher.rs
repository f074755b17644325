//! File system watcher that keeps the cache honest
//!
//! Changes and deletions evict the file's cached rows; the next request
//! recomputes them. Creations are ignored until something asks for the file.
//! Only paths with a recognized source extension are considered, which also
//! keeps the watcher from reacting to its own database writes.

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::CodeIndexer;
use crate::parsing::Language;

/// Errors specific to file watching operations
#[derive(Error, Debug)]
pub enum FileWatchError {
    #[error(
        "Failed to initialize file watcher: {reason}\nSuggestion: Check file system permissions and the platform's inotify/FSEvents limits"
    )]
    WatcherInitFailed { reason: String },

    #[error(
        "Cannot watch path {path:?}: {reason}\nSuggestion: Verify the path exists and you have read permissions"
    )]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}\nSuggestion: Check disk space and file system health")]
    EventError { details: String },
}

/// A change to one source file, reduced to what the cache cares about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Changed(p) | Self::Deleted(p) => p,
        }
    }
}

/// Map a notify event onto [`FileEvent`]s for source files.
///
/// Renames become a deletion of the old name and a creation of the new one.
pub fn classify_event(event: &Event) -> Vec<FileEvent> {
    let events: Vec<FileEvent> = match &event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FileEvent::Created).collect(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(FileEvent::Deleted).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            FileEvent::Deleted(event.paths[0].clone()),
            FileEvent::Created(event.paths[1].clone()),
        ],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().cloned().map(FileEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().cloned().map(FileEvent::Created).collect()
        }
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => Vec::new(),
        EventKind::Modify(_) => event.paths.iter().cloned().map(FileEvent::Changed).collect(),
        EventKind::Any | EventKind::Other => Vec::new(),
    };

    events
        .into_iter()
        .filter(|e| Language::from_path(e.path()).is_some())
        .collect()
}

/// Collapses bursts of events per path.
///
/// A path is released once no new event for it has arrived for the
/// debounce interval. The last event seen wins, except that a creation
/// never hides an earlier change or deletion in the same burst: an atomic
/// save (delete then create) is released as a change.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: HashMap<PathBuf, (FileEvent, Instant)>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: HashMap::new(),
        }
    }

    pub fn push(&mut self, event: FileEvent, now: Instant) {
        let path = event.path().to_path_buf();
        let merged = match (self.pending.remove(&path), event) {
            (
                Some((FileEvent::Changed(_) | FileEvent::Deleted(_), _)),
                FileEvent::Created(path),
            ) => FileEvent::Changed(path),
            (_, event) => event,
        };
        self.pending.insert(path, (merged, now));
    }

    /// Events whose path has been quiet for the full interval, sorted by path
    pub fn drain_ready(&mut self, now: Instant) -> Vec<FileEvent> {
        let interval = self.interval;
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, seen))| now.saturating_duration_since(*seen) >= interval)
            .map(|(path, _)| path.clone())
            .collect();

        let mut events: Vec<FileEvent> = ready
            .into_iter()
            .filter_map(|path| self.pending.remove(&path).map(|(event, _)| event))
            .collect();
        events.sort_by(|a, b| a.path().cmp(b.path()));
        events
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Watches a directory tree and feeds changes to a [`CodeIndexer`]
pub struct FileSystemWatcher {
    indexer: Arc<CodeIndexer>,
    debounce: Duration,
    event_rx: Receiver<notify::Result<Event>>,
    /// Kept alive for as long as events should flow
    watcher: RecommendedWatcher,
}

impl FileSystemWatcher {
    pub fn new(indexer: Arc<CodeIndexer>, debounce_ms: u64) -> Result<Self, FileWatchError> {
        let (tx, rx) = unbounded();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watcher is shutting down
            let _ = tx.send(res);
        })
        .map_err(|e| FileWatchError::WatcherInitFailed {
            reason: e.to_string(),
        })?;

        Ok(Self {
            indexer,
            debounce: Duration::from_millis(debounce_ms),
            event_rx: rx,
            watcher,
        })
    }

    /// Watch `root` recursively until `stop` is set.
    ///
    /// Eviction failures are logged and do not stop the loop.
    pub fn watch(mut self, root: &Path, stop: &AtomicBool) -> Result<(), FileWatchError> {
        self.watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| FileWatchError::PathWatchFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!("Watching {} for changes", root.display());

        let tick = self.debounce.clamp(Duration::from_millis(10), Duration::from_millis(250));
        let mut debouncer = Debouncer::new(self.debounce);

        while !stop.load(Ordering::Relaxed) {
            match self.event_rx.recv_timeout(tick) {
                Ok(Ok(event)) => {
                    let now = Instant::now();
                    for file_event in classify_event(&event) {
                        debouncer.push(file_event, now);
                    }
                }
                Ok(Err(e)) => warn!(
                    "{}",
                    FileWatchError::EventError {
                        details: e.to_string()
                    }
                ),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(FileWatchError::EventError {
                        details: "event channel closed".to_string(),
                    });
                }
            }

            for event in debouncer.drain_ready(Instant::now()) {
                match self.indexer.handle_event(&event) {
                    Ok(true) => info!("Evicted {} after {:?}", event.path().display(), event),
                    Ok(false) => debug!("No cached rows for {:?}", event),
                    Err(e) => warn!("Failed to handle {:?}: {e}", event),
                }
            }
        }

        debug!("File watcher stopped");
        Ok(())
    }
}
