//! Persistent cache: one SQLite database holding embeddings, structural
//! descriptions, code patterns and file relationships.

mod records;
pub mod schema;
mod store;

pub use records::{
    AstRecord, CodePatternRecord, EmbeddingRecord, FileEntry, StoreStats, StoredFile,
    UpsertOutcome,
};
pub use store::CodeStore;
