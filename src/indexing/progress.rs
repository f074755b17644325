//! Progress reporting for indexing operations

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const MAX_RECORDED_ERRORS: usize = 100;

/// Statistics collected during a directory scan
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexStats {
    /// Files returned by the scanner
    pub scanned: usize,

    /// Files (re)computed and written to the store
    pub indexed: usize,

    /// Files whose content hash matched the cached row
    pub cached: usize,

    /// Files with no recognized language
    pub skipped: usize,

    /// Files that could not be read or analyzed
    pub failed: usize,

    /// Time elapsed during indexing
    pub elapsed: Duration,

    /// Errors encountered (limited to the first 100)
    pub errors: Vec<(PathBuf, String)>,

    #[serde(skip)]
    start_time: Option<Instant>,
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push((path, error));
        }
        self.failed += 1;
    }

    /// Files the scan has dealt with so far
    pub fn processed(&self) -> usize {
        self.indexed + self.cached + self.skipped + self.failed
    }

    /// Display the statistics in a human-readable format
    pub fn display(&self) {
        println!("\nIndexing Complete:");
        println!("  Files scanned: {}", self.scanned);
        println!("  Files indexed: {}", self.indexed);
        println!("  Files cached: {}", self.cached);
        println!("  Files skipped: {}", self.skipped);
        println!("  Files failed: {}", self.failed);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.indexed > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.indexed as f64 / self.elapsed.as_secs_f64();
            println!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.errors.is_empty() {
            println!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (path, error) in &self.errors[..5.min(self.errors.len())] {
                println!("  {}: {}", path.display(), error);
            }
            if self.errors.len() > 5 {
                println!("  ... and {} more errors", self.errors.len() - 5);
            }
        }
    }
}
