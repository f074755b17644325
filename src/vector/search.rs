//! Similarity ranking with relevance boosts.
//!
//! Every comparable candidate is scored by cosine similarity against the
//! query, boosted by metadata overlap and clamped to [0, 1]. Candidates
//! produced by a different model type, or with a different vector length,
//! are skipped rather than compared.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Embedding, ModelType, cosine_similarity};

pub const LANGUAGE_BOOST: f32 = 0.1;
pub const PATTERN_BOOST: f32 = 0.05;
pub const FUNCTION_BOOST: f32 = 0.03;

/// Optional relevance boosts for a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Language tag that earns [`LANGUAGE_BOOST`]
    pub language: Option<String>,
    /// Code-pattern tags, each match earns [`PATTERN_BOOST`]
    pub patterns: Vec<String>,
    /// Function names, each match earns [`FUNCTION_BOOST`]
    pub functions: Vec<String>,
}

impl SearchOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_functions(mut self, functions: Vec<String>) -> Self {
        self.functions = functions;
        self
    }

    fn boost(&self, candidate: &impl SearchCandidate) -> f32 {
        let mut boost = 0.0;
        if self
            .language
            .as_deref()
            .is_some_and(|lang| lang == candidate.language())
        {
            boost += LANGUAGE_BOOST;
        }
        let patterns = candidate.patterns();
        boost += self.patterns.iter().filter(|p| patterns.contains(*p)).count() as f32
            * PATTERN_BOOST;
        let functions = candidate.functions();
        boost += self
            .functions
            .iter()
            .filter(|f| functions.contains(*f))
            .count() as f32
            * FUNCTION_BOOST;
        boost
    }
}

/// A stored vector that can be ranked against a query
pub trait SearchCandidate {
    fn vector(&self) -> &[f32];
    fn model_type(&self) -> &ModelType;
    fn language(&self) -> &str;
    fn patterns(&self) -> &[String];
    fn functions(&self) -> &[String];
}

/// A ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch<T> {
    pub item: T,
    /// Boosted score, clamped to [0, 1]
    pub similarity: f32,
    /// Raw cosine similarity before boosts
    pub cosine: f32,
}

/// Rank `candidates` against `query` and keep the best `limit`.
///
/// The sort is stable, so equal scores keep the candidates' input order.
pub fn rank<T, I>(
    query: &Embedding,
    candidates: I,
    limit: usize,
    options: &SearchOptions,
) -> Vec<ScoredMatch<T>>
where
    T: SearchCandidate,
    I: IntoIterator<Item = T>,
{
    let mut scored: Vec<ScoredMatch<T>> = candidates
        .into_iter()
        .filter(|c| query.is_comparable(c.model_type(), c.vector().len()))
        .map(|item| {
            let cosine = cosine_similarity(&query.vector, item.vector());
            let similarity = (cosine + options.boost(&item)).clamp(0.0, 1.0);
            ScoredMatch {
                item,
                similarity,
                cosine,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}
