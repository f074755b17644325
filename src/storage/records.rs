//! Row types read from and written to the cache database

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{ArchitecturalPattern, CodeMetrics, FileAnalysis, FileMetadata};
use crate::parsing::StructuralDescription;
use crate::relationship::Relationship;
use crate::vector::{Embedding, ModelType, SearchCandidate};

/// Everything computed for one file, ready to be written
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: String,
    pub content_hash: String,
    pub language: String,
    pub file_size: u64,
    pub embedding: Embedding,
    pub metadata: FileMetadata,
    /// `None` when structural extraction failed
    pub analysis: Option<FileAnalysis>,
}

/// One row of the `embeddings` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRecord {
    pub path: String,
    pub content_hash: String,
    pub embedding: Embedding,
    pub metadata: FileMetadata,
    pub file_size: u64,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl SearchCandidate for EmbeddingRecord {
    fn vector(&self) -> &[f32] {
        &self.embedding.vector
    }

    fn model_type(&self) -> &ModelType {
        &self.embedding.model_type
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn patterns(&self) -> &[String] {
        &self.metadata.patterns
    }

    fn functions(&self) -> &[String] {
        &self.metadata.functions
    }
}

/// One row of the `ast_data` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstRecord {
    pub path: String,
    pub content_hash: String,
    pub ast: StructuralDescription,
    pub architectural_patterns: Vec<ArchitecturalPattern>,
    pub code_metrics: CodeMetrics,
    pub relationships: Vec<Relationship>,
    pub created_at: DateTime<Utc>,
}

/// A cached file: its embedding row plus the structural row when present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    #[serde(flatten)]
    pub embedding: EmbeddingRecord,
    pub ast: Option<AstRecord>,
}

impl StoredFile {
    pub fn path(&self) -> &str {
        &self.embedding.path
    }

    pub fn content_hash(&self) -> &str {
        &self.embedding.content_hash
    }
}

/// One row of the `code_patterns` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePatternRecord {
    pub pattern_type: String,
    pub pattern_content: String,
    pub file_paths: Vec<String>,
    pub frequency: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of [`CodeStore::upsert`](super::CodeStore::upsert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// The path existed with different content
    Replaced { previous_hash: String },
    /// Same path and hash; nothing was written
    Unchanged,
}

impl UpsertOutcome {
    pub fn wrote(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Corpus summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_files: usize,
    pub total_size: u64,
    pub languages: BTreeMap<String, usize>,
    pub pattern_types: BTreeMap<String, usize>,
    pub relationships: usize,
}
