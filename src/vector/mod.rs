//! Feature vectors and similarity search.
//!
//! Files are embedded either by a local fastembed model or by a
//! deterministic heuristic. Every vector carries a [`ModelType`] tag and
//! search only compares vectors that share it.

mod embedder;
mod search;
mod similarity;
mod types;

pub use embedder::{
    Embedder, FallbackEmbedder, HEURISTIC_DIMENSION, HeuristicEmbedder, ModelBackedEmbedder,
    SUPPORTED_MODELS, parse_embedding_model,
};
pub use search::{
    FUNCTION_BOOST, LANGUAGE_BOOST, PATTERN_BOOST, ScoredMatch, SearchCandidate, SearchOptions,
    rank,
};
pub use similarity::{cosine_similarity, normalize};
pub use types::{Embedding, ModelType, VectorError, VectorResult};
