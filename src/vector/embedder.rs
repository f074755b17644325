//! Embedding strategies.
//!
//! Two interchangeable [`Embedder`] implementations sit behind one
//! contract:
//!
//! - [`ModelBackedEmbedder`] runs a fastembed model locally and produces
//!   normalized vectors (384 dimensions for `AllMiniLML6V2`).
//! - [`HeuristicEmbedder`] counts language constructs, common code tokens
//!   and layout statistics. Deterministic and always available.
//!
//! [`FallbackEmbedder`] composes the two: it prefers the model and falls
//! through to the heuristic strategy whenever the model is missing or
//! fails. Its `embed` never returns an error.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use regex::Regex;
use std::sync::{LazyLock, Mutex};
use tracing::{debug, warn};

use super::similarity::normalize;
use super::{Embedding, ModelType, VectorError, VectorResult};
use crate::config::{EmbeddingConfig, models_dir};

/// Model names accepted in `embedding.model`
pub const SUPPORTED_MODELS: &[&str] = &[
    "AllMiniLML6V2",
    "AllMiniLML12V2",
    "BGESmallENV15",
    "BGEBaseENV15",
    "MultilingualE5Small",
];

pub fn parse_embedding_model(name: &str) -> VectorResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        _ => Err(VectorError::UnknownModel(name.to_string())),
    }
}

/// Strategy interface for turning text into a vector.
///
/// Implementations must be thread-safe; the indexer embeds files from a
/// rayon pool.
pub trait Embedder: Send + Sync {
    /// Tag stored with every vector this embedder produces
    fn model_type(&self) -> ModelType;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;
}

/// fastembed-backed embedder.
///
/// The model is loaded once and guarded by a mutex; fastembed sessions
/// need `&mut` access.
pub struct ModelBackedEmbedder {
    model: Mutex<TextEmbedding>,
    name: String,
    dimension: usize,
}

impl ModelBackedEmbedder {
    /// Load (downloading on first use) the named model into the shared models directory.
    ///
    /// # Errors
    /// Returns an error if the name is unknown or the model fails to initialize.
    pub fn new(name: &str) -> VectorResult<Self> {
        let model_kind = parse_embedding_model(name)?;
        let mut model = TextEmbedding::try_new(
            InitOptions::new(model_kind)
                .with_cache_dir(models_dir())
                .with_show_download_progress(false),
        )
        .map_err(|e| VectorError::ModelInit {
            model: name.to_string(),
            reason: e.to_string(),
        })?;

        // Probe once so the dimension is known before the first real call
        let probe = model
            .embed(vec!["probe".to_string()], None)
            .map_err(|e| VectorError::ModelInit {
                model: name.to_string(),
                reason: format!("probe embedding failed: {e}"),
            })?;
        let dimension = probe.first().map_or(0, Vec::len);

        Ok(Self {
            model: Mutex::new(model),
            name: name.to_string(),
            dimension,
        })
    }
}

impl Embedder for ModelBackedEmbedder {
    fn model_type(&self) -> ModelType {
        ModelType::Model(self.name.clone())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let mut embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(vec![text.to_string()], None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        let mut vector = embeddings
            .pop()
            .ok_or_else(|| VectorError::EmbeddingFailed("model returned no vectors".to_string()))?;
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

/// Counted constructs, one feature each
static CONSTRUCTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"function\s+\w+",
        r"class\s+\w+",
        r"const\s+\w+",
        r"let\s+\w+",
        r"var\s+\w+",
        r"if\s*\(",
        r"for\s*\(",
        r"while\s*\(",
        r"try\s*\{",
        r"catch\s*\(",
        r"require\s*\(",
        r"import\s+",
        r"export\s+",
        r"async\s+",
        r"await\s+",
        r"throw\s+",
        r"console\.log",
        r"console\.error",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid construct regex"))
    .collect()
});

/// Token vocabulary for the term-frequency block
const VOCABULARY: &[&str] = &[
    "function", "return", "const", "let", "var", "if", "else", "for", "while", "try", "catch",
    "throw", "async", "await", "class", "extends", "constructor", "require", "import", "export",
    "module", "error", "data", "result", "response",
];

/// 18 construct counts plus function and class density
const CONSTRUCT_FEATURES: usize = 20;
const LAYOUT_FEATURES: usize = 8;

/// Length of every heuristic vector
pub const HEURISTIC_DIMENSION: usize = CONSTRUCT_FEATURES + VOCABULARY.len() + LAYOUT_FEATURES;

/// Deterministic embedder built from three concatenated feature blocks.
///
/// Counts go through `ln(1 + x)` so that file size does not swamp the
/// direction of the vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEmbedder;

impl HeuristicEmbedder {
    /// Infallible form of [`Embedder::embed`]
    pub fn features(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(HEURISTIC_DIMENSION);
        let lines: Vec<&str> = text.split('\n').collect();
        let line_count = lines.len() as f32;

        // Language constructs
        let counts: Vec<f32> = CONSTRUCTS
            .iter()
            .map(|re| re.find_iter(text).count() as f32)
            .collect();
        vector.extend(counts.iter().map(|c| c.ln_1p()));
        vector.push(counts[0] / line_count);
        vector.push(counts[1] / line_count);

        // Term frequency over the vocabulary
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| w.len() > 1)
            .collect();
        let total = words.len();
        vector.extend(VOCABULARY.iter().map(|term| {
            if total == 0 {
                0.0
            } else {
                words.iter().filter(|w| *w == term).count() as f32 / total as f32
            }
        }));

        // Layout
        let blank = lines.iter().filter(|l| l.trim().is_empty()).count() as f32;
        let comments = lines
            .iter()
            .filter(|l| l.trim_start().starts_with("//"))
            .count() as f32;
        let indents: Vec<usize> = lines
            .iter()
            .map(|l| l.len() - l.trim_start().len())
            .filter(|&indent| indent > 0)
            .collect();
        let avg_indent = if indents.is_empty() {
            0.0
        } else {
            indents.iter().sum::<usize>() as f32 / indents.len() as f32
        };
        let count_char = |ch: char| text.chars().filter(|c| *c == ch).count() as f32;

        vector.push(line_count.ln_1p());
        vector.push((text.len() as f32).ln_1p());
        vector.push(blank / line_count);
        vector.push(comments / line_count);
        vector.push(avg_indent.ln_1p());
        vector.push(count_char('{').ln_1p());
        vector.push(count_char('(').ln_1p());
        vector.push(count_char('[').ln_1p());

        vector
    }
}

impl Embedder for HeuristicEmbedder {
    fn model_type(&self) -> ModelType {
        ModelType::Heuristic
    }

    fn dimension(&self) -> usize {
        HEURISTIC_DIMENSION
    }

    fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let vector = self.features(text);
        if vector.len() != HEURISTIC_DIMENSION {
            return Err(VectorError::DimensionMismatch {
                expected: HEURISTIC_DIMENSION,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

/// Prefers a primary embedder and falls back to [`HeuristicEmbedder`].
pub struct FallbackEmbedder {
    primary: Option<Box<dyn Embedder>>,
    fallback: HeuristicEmbedder,
}

impl FallbackEmbedder {
    /// Heuristic vectors only
    pub fn heuristic_only() -> Self {
        Self {
            primary: None,
            fallback: HeuristicEmbedder,
        }
    }

    pub fn with_primary(primary: Box<dyn Embedder>) -> Self {
        Self {
            primary: Some(primary),
            fallback: HeuristicEmbedder,
        }
    }

    /// Load the configured model when enabled. A model that fails to load
    /// is logged and replaced by the heuristic strategy.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        if !config.model_enabled {
            debug!("Embedding model disabled, using heuristic vectors");
            return Self::heuristic_only();
        }

        match ModelBackedEmbedder::new(&config.model) {
            Ok(model) => {
                debug!(
                    "Loaded embedding model {} ({} dimensions)",
                    config.model,
                    model.dimension()
                );
                Self::with_primary(Box::new(model))
            }
            Err(e) => {
                warn!("Embedding model unavailable, falling back to heuristic vectors: {e}");
                Self::heuristic_only()
            }
        }
    }

    /// Model type new vectors are expected to carry
    pub fn active_model_type(&self) -> ModelType {
        self.primary
            .as_ref()
            .map_or(ModelType::Heuristic, |p| p.model_type())
    }

    pub fn has_model(&self) -> bool {
        self.primary.is_some()
    }

    /// Embed `text`. Never fails: model errors fall through to the heuristic
    /// strategy, and a heuristic failure yields a zero vector.
    pub fn embed(&self, text: &str) -> Embedding {
        if let Some(primary) = &self.primary {
            match primary.embed(text) {
                Ok(vector) => return Embedding::new(vector, primary.model_type()),
                Err(e) => warn!("Model embedding failed, using heuristic vector: {e}"),
            }
        }

        match self.fallback.embed(text) {
            Ok(vector) => Embedding::new(vector, ModelType::Heuristic),
            Err(e) => {
                warn!("Heuristic embedding failed, storing zero vector: {e}");
                Embedding::new(vec![0.0; HEURISTIC_DIMENSION], ModelType::Heuristic)
            }
        }
    }
}
