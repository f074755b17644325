//! Error types for the code-intelligence cache
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing and analysis operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Raised only for explicit single-file analysis. Bulk scans skip these files.
    #[error(
        "Unsupported file type '{extension}' for file '{path}'. Supported types: .js .jsx .mjs .ts .tsx .py .cpp .cc .cxx .hpp .h .c .java .go .rs"
    )]
    UnsupportedLanguage { path: PathBuf, extension: String },

    /// Structural extraction failed for a file
    #[error("Failed to analyze {language} file '{path}': {reason}")]
    Extraction {
        path: PathBuf,
        language: String,
        reason: String,
    },

    /// Persistent store errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// Scan was abandoned between batches
    #[error("Indexing cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::UnsupportedLanguage { .. } => "UNSUPPORTED_LANGUAGE",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::UnsupportedLanguage { .. } => vec![
                "Rename the file with a recognized source extension",
                "Use 'codesense index' to scan a directory; unknown files are skipped there",
            ],
            Self::Storage(_) => vec![
                "Check disk space and permissions for the .codesense directory",
                "Delete .codesense/cache.db to rebuild the cache from scratch",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'codesense init --force' to regenerate the settings file",
            ],
            _ => vec![],
        }
    }
}

/// Errors specific to the persistent store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to (de)serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("Stored embedding for '{path}' is corrupt: {reason}")]
    CorruptEmbedding { path: String, reason: String },

    #[error("Failed to prepare database directory '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn json(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Serialization { what, source }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T, IndexError>;

    /// Add context with a path
    fn with_path(self, path: &std::path::Path) -> Result<T, IndexError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, IndexError> {
        self.map_err(|e| IndexError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, IndexError> {
        self.map_err(|e| {
            IndexError::General(format!("Error processing '{}': {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        let err = IndexError::UnsupportedLanguage {
            path: PathBuf::from("notes.xyz"),
            extension: "xyz".to_string(),
        };
        assert_eq!(err.status_code(), "UNSUPPORTED_LANGUAGE");
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.to_string().contains("notes.xyz"));
    }

    #[test]
    fn test_storage_error_converts() {
        let err: IndexError = StorageError::CorruptEmbedding {
            path: "a.js".to_string(),
            reason: "odd byte length".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), "STORAGE_ERROR");
        assert!(err.to_string().contains("a.js"));
    }

    #[test]
    fn test_error_context() {
        let res: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let err = res.context("loading").unwrap_err();
        assert_eq!(err.to_string(), "loading: boom");
    }
}
