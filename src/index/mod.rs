//! In-memory embedding index over ingested passages.
//!
//! An [`Index`] is built once from the full passage set and never mutated
//! afterwards. [`IndexCell`] owns the process-wide build lifecycle.

mod builder;
mod cell;

pub use builder::IndexBuilder;
pub use cell::{IndexCell, IndexStatus};

use crate::ingest::Passage;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A passage together with its embedding vector.
#[derive(Debug, Clone)]
pub struct IndexedPassage {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

/// A passage with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    /// The matched passage.
    pub passage: Passage,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Immutable set of embedded passages.
#[derive(Debug)]
pub struct Index {
    entries: Vec<IndexedPassage>,
    dimensions: usize,
    embedding_model: String,
    built_at: DateTime<Utc>,
}

impl Index {
    /// Create an index from entries sharing one dimensionality.
    ///
    /// Entries are kept in the given order, which is the tie-break order for
    /// equal scores. Returns `None` if vector lengths differ.
    pub fn new(entries: Vec<IndexedPassage>, embedding_model: impl Into<String>) -> Option<Self> {
        let dimensions = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if entries.iter().any(|e| e.embedding.len() != dimensions) {
            return None;
        }

        Some(Self {
            entries,
            dimensions,
            embedding_model: embedding_model.into(),
            built_at: Utc::now(),
        })
    }

    /// An index with no passages.
    pub fn empty(embedding_model: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            dimensions: 0,
            embedding_model: embedding_model.into(),
            built_at: Utc::now(),
        }
    }

    /// Number of indexed passages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector length shared by every entry (0 when empty).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Identity of the embedding space the vectors live in.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// When the index finished building.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Indexed passages in ingestion order.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.entries.iter().map(|e| &e.passage)
    }

    /// Top `limit` passages by cosine similarity to `query_embedding`.
    ///
    /// Scores are non-increasing; equal scores keep ingestion order.
    pub fn search(&self, query_embedding: &[f32], limit: usize, min_score: Option<f32>) -> Vec<ScoredPassage> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .filter(|(_, score)| min_score.map_or(true, |min| *score >= min))
            .collect();

        // Stable sort keeps ingestion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| ScoredPassage {
                passage: self.entries[i].passage.clone(),
                score,
            })
            .collect()
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
