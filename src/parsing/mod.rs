//! Language classification and structural extraction.
//!
//! Extraction is textual: each language has an ordered rule set of regular
//! expressions plus brace or indentation tracking. It is an approximation of
//! a syntax tree, good enough for pattern detection and relationship edges.

pub mod cpp;
pub mod generic;
pub mod java;
pub mod javascript;
pub mod language;
pub mod python;
pub mod registry;
pub mod structure;
pub mod text;

pub use language::Language;
pub use registry::{
    ExtractError, ExtractResult, ExtractorRegistry, StructureExtractor, get_registry,
};
pub use structure::{
    AsyncStats, ClassInfo, CommentStats, ConstructorInfo, ErrorHandlingStats, ExportInfo,
    ExportKind, FunctionInfo, ImportInfo, ImportKind, IncludeInfo, InterfaceInfo, MethodInfo,
    Parameter, PropertyInfo, StructuralDescription, StructureInfo, Visibility,
};
