//! Core types for embeddings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies which embedder produced a vector.
///
/// Vectors from different model types are never compared with each other;
/// their lengths and value spaces differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ModelType {
    /// Deterministic feature-count vectors
    Heuristic,
    /// A named embedding model, e.g. `AllMiniLML6V2`
    Model(String),
}

impl ModelType {
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Self::Heuristic)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => f.write_str("heuristic"),
            Self::Model(name) => write!(f, "model:{name}"),
        }
    }
}

impl FromStr for ModelType {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(Self::Heuristic),
            _ => match s.strip_prefix("model:") {
                Some(name) if !name.is_empty() => Ok(Self::Model(name.to_string())),
                _ => Err(VectorError::UnknownModelType(s.to_string())),
            },
        }
    }
}

impl From<ModelType> for String {
    fn from(model: ModelType) -> Self {
        model.to_string()
    }
}

impl TryFrom<String> for ModelType {
    type Error = VectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A vector together with the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model_type: ModelType,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model_type: ModelType) -> Self {
        Self { vector, model_type }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Whether cosine similarity against a vector of `model_type` and
    /// `dimension` is meaningful
    pub fn is_comparable(&self, model_type: &ModelType, dimension: usize) -> bool {
        &self.model_type == model_type && self.vector.len() == dimension
    }

    /// Little-endian `f32` bytes, the on-disk form
    pub fn to_bytes(&self) -> Vec<u8> {
        self.vector.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8], model_type: ModelType) -> VectorResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(VectorError::Serialization(format!(
                "embedding blob of {} bytes is not a whole number of f32 values",
                bytes.len()
            )));
        }
        let vector = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self { vector, model_type })
    }
}

/// Errors that can occur during embedding operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Failed to initialize embedding model {model}: {reason}\nSuggestion: Ensure you have internet connection for first-time model download, or set embedding.model_enabled = false"
    )]
    ModelInit { model: String, reason: String },

    #[error("Unknown embedding model: {0}\nSuggestion: Use one of {supported}", supported = super::embedder::SUPPORTED_MODELS.join(", "))]
    UnknownModel(String),

    #[error("Unknown model type tag: {0}\nSuggestion: The stored row may come from a newer version; re-index the file")]
    UnknownModelType(String),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(
        "Serialization error: {0}\nSuggestion: Check that vector data is valid and not corrupted"
    )]
    Serialization(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_tags() {
        assert_eq!(ModelType::Heuristic.to_string(), "heuristic");
        let model = ModelType::Model("AllMiniLML6V2".to_string());
        assert_eq!(model.to_string(), "model:AllMiniLML6V2");

        assert_eq!("heuristic".parse::<ModelType>().unwrap(), ModelType::Heuristic);
        assert_eq!("model:AllMiniLML6V2".parse::<ModelType>().unwrap(), model);
        assert!("model:".parse::<ModelType>().is_err());
        assert!("custom".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let embedding = Embedding::new(vec![0.5, -1.25, 3.0], ModelType::Heuristic);
        let bytes = embedding.to_bytes();
        assert_eq!(bytes.len(), 12);
        let back = Embedding::from_bytes(&bytes, ModelType::Heuristic).unwrap();
        assert_eq!(back, embedding);

        let err = Embedding::from_bytes(&bytes[..5], ModelType::Heuristic).unwrap_err();
        assert!(matches!(err, VectorError::Serialization(_)));
    }

    #[test]
    fn test_comparability() {
        let heuristic = Embedding::new(vec![1.0, 2.0], ModelType::Heuristic);
        let model = Embedding::new(vec![1.0, 2.0], ModelType::Model("m".to_string()));
        let short = Embedding::new(vec![1.0], ModelType::Heuristic);

        assert!(heuristic.is_comparable(&heuristic.model_type, heuristic.dimension()));
        assert!(!heuristic.is_comparable(&model.model_type, model.dimension()));
        assert!(!heuristic.is_comparable(&short.model_type, short.dimension()));
    }

    #[test]
    fn test_serde_uses_tag() {
        let json = serde_json::to_string(&ModelType::Model("m".to_string())).unwrap();
        assert_eq!(json, "\"model:m\"");
        let back: ModelType = serde_json::from_str("\"heuristic\"").unwrap();
        assert_eq!(back, ModelType::Heuristic);
    }
}
