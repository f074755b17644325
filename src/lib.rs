//! Local code-intelligence cache.
//!
//! Extracts lightweight structure from source files, turns each file into a
//! feature vector, persists both in SQLite keyed by content hash, and answers
//! similarity, relationship and architectural-pattern queries over the corpus.

pub mod analysis;
pub mod config;
pub mod error;
pub mod indexing;
pub mod parsing;
pub mod relationship;
pub mod storage;
pub mod vector;

// Explicit exports for better API clarity
pub use analysis::{ArchitecturalPattern, FileAnalysis, FileMetadata, PatternOccurrence};
pub use config::Settings;
pub use error::{IndexError, IndexResult, StorageError, StorageResult};
pub use indexing::{AnalyzedFile, CodeIndexer, FileEvent, IndexStats, calculate_hash};
pub use parsing::{Language, StructuralDescription};
pub use relationship::{Direction, RelatedFile, RelationKind, Relationship};
pub use storage::{CodeStore, EmbeddingRecord, StoredFile};
pub use vector::{Embedding, FallbackEmbedder, ModelType, ScoredMatch, SearchOptions};
