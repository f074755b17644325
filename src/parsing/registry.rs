//! Extractor registry
//!
//! Dispatch table from [`Language`] to the [`StructureExtractor`] that knows
//! its rule set. Languages without a dedicated extractor fall back to the
//! generic one, so lookups never fail.
//!
//! Each language module registers itself through a `register` function,
//! which keeps replacing one rule set (say, with a real parser) a one-line
//! change here.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use super::{Language, StructuralDescription};

/// Extraction errors with actionable suggestions
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "Failed to extract structure from {language} source: {reason}\nSuggestion: The file may use syntax the textual rules cannot follow; it is skipped during bulk scans"
    )]
    Failed { language: Language, reason: String },

    #[error("Extractor for {extractor} was asked to handle {requested}")]
    WrongLanguage {
        extractor: &'static str,
        requested: Language,
    },
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Produces a [`StructuralDescription`] from source text.
///
/// Implementations must be deterministic: the same text always yields the
/// same description with items in the same order.
pub trait StructureExtractor: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Languages this extractor serves
    fn languages(&self) -> &'static [Language];

    fn extract(&self, content: &str, language: Language) -> ExtractResult<StructuralDescription>;
}

/// Language to extractor dispatch table
pub struct ExtractorRegistry {
    extractors: HashMap<Language, Arc<dyn StructureExtractor>>,
    fallback: Arc<dyn StructureExtractor>,
}

impl ExtractorRegistry {
    /// Empty registry: every language goes to the generic extractor
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            fallback: Arc::new(super::generic::GenericExtractor),
        }
    }

    /// Registry with every built-in rule set
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        initialize_registry(&mut registry);
        registry
    }

    /// Register an extractor for each language it declares, replacing earlier entries
    pub fn register(&mut self, extractor: Arc<dyn StructureExtractor>) {
        for language in extractor.languages() {
            self.extractors.insert(*language, Arc::clone(&extractor));
        }
    }

    /// Extractor for `language`, or the generic fallback
    pub fn get(&self, language: Language) -> &dyn StructureExtractor {
        self.extractors
            .get(&language)
            .map(|e| &**e)
            .unwrap_or(&*self.fallback)
    }

    /// Whether a dedicated (non-fallback) extractor exists
    pub fn has_dedicated(&self, language: Language) -> bool {
        self.extractors.contains_key(&language)
    }

    /// Run the extractor for `language`.
    ///
    /// A panicking rule set is reported as [`ExtractError::Failed`] so one
    /// odd file cannot take down a whole scan.
    pub fn extract(
        &self,
        content: &str,
        language: Language,
    ) -> ExtractResult<StructuralDescription> {
        let extractor = self.get(language);
        catch_unwind(AssertUnwindSafe(|| extractor.extract(content, language))).unwrap_or_else(
            |payload| {
                let reason = format!(
                    "{} rules panicked: {}",
                    extractor.name(),
                    panic_message(payload.as_ref())
                );
                Err(ExtractError::Failed { language, reason })
            },
        )
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Each language module adds itself here
fn initialize_registry(registry: &mut ExtractorRegistry) {
    super::javascript::register(registry);
    super::python::register(registry);
    super::cpp::register(registry);
    super::java::register(registry);
    // Go and Rust use the generic rule set
}

static REGISTRY: LazyLock<ExtractorRegistry> = LazyLock::new(ExtractorRegistry::with_defaults);

/// Get the shared registry with the built-in rule sets
pub fn get_registry() -> &'static ExtractorRegistry {
    &REGISTRY
}
