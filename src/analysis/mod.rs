//! Analysis over extracted structure: design patterns, metrics and the
//! enhanced metadata stored with each embedding.

pub mod metadata;
pub mod metrics;
pub mod patterns;

pub use metadata::{
    ApiCall, ApiCallKind, AstSummary, ClassSummary, FileMetadata, ImportSummary, SecurityProfile,
    code_pattern_tags,
};
pub use metrics::{CodeMetrics, InheritanceMetrics};
pub use patterns::{
    ArchitecturalPattern, MAX_PATTERNS, PatternOccurrence, detect_patterns, summarize_patterns,
};

use crate::parsing::StructuralDescription;
use crate::relationship::{Relationship, extract_relationships};

/// Everything derived from one file's structural description
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub description: StructuralDescription,
    pub patterns: Vec<ArchitecturalPattern>,
    pub metrics: CodeMetrics,
    pub relationships: Vec<Relationship>,
}

impl FileAnalysis {
    pub fn from_description(path: &str, content: &str, description: StructuralDescription) -> Self {
        let patterns = detect_patterns(&description);
        let metrics = CodeMetrics::compute(&description, content.lines().count());
        let relationships = extract_relationships(path, &description);
        Self {
            description,
            patterns,
            metrics,
            relationships,
        }
    }
}
