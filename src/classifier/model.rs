//! Capability interface for the pre-trained model artifacts.
//!
//! The classifier only sees these traits. Concrete JSON-backed implementations
//! live in [`super::artifacts`]; tests substitute stubs.

use std::sync::Arc;

use crate::error::ModelError;

use super::features::META_FEATURE_COUNT;

// ── Sparse vector ───────────────────────────────────────────────────

/// Fixed-dimension sparse vector with entries sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    dimension: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// All-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build from unordered `(index, value)` pairs. Duplicate indices are
    /// summed and zeros dropped.
    pub fn from_entries(dimension: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|&(idx, _)| idx);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (idx, value) in entries {
            debug_assert!(idx < dimension, "index {idx} out of bounds for {dimension}");
            match merged.last_mut() {
                Some((last, acc)) if *last == idx => *acc += value,
                _ => merged.push((idx, value)),
            }
        }
        merged.retain(|&(_, v)| v != 0.0);
        Self {
            dimension,
            entries: merged,
        }
    }

    /// Build from a dense sequence; dimension is the sequence length.
    pub fn from_dense<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut dimension = 0;
        let mut entries = Vec::new();
        for (idx, value) in values.into_iter().enumerate() {
            dimension = idx + 1;
            if value != 0.0 {
                entries.push((idx, value));
            }
        }
        Self { dimension, entries }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Horizontal concatenation: `other`'s indices are shifted past `self`.
    pub fn hstack(&self, other: &SparseVector) -> SparseVector {
        let offset = self.dimension;
        let mut entries = Vec::with_capacity(self.entries.len() + other.entries.len());
        entries.extend_from_slice(&self.entries);
        entries.extend(other.entries.iter().map(|&(idx, v)| (idx + offset, v)));
        SparseVector {
            dimension: self.dimension + other.dimension,
            entries,
        }
    }

    /// Dot product against dense weights. Indices past `weights` contribute 0.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(idx, v)| weights.get(idx).map(|w| w * v))
            .sum()
    }
}

// ── Capability traits ───────────────────────────────────────────────

/// Converts preprocessed text into a fixed-schema sparse vector.
pub trait TextVectorizer: Send + Sync {
    /// Width of every vector this vectorizer produces.
    fn dimension(&self) -> usize;

    fn transform(&self, text: &str) -> SparseVector;
}

/// Trained classifier over the combined feature vector.
pub trait LabelPredictor: Send + Sync {
    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;

    /// Predict the numeric class code.
    fn predict(&self, features: &SparseVector) -> Result<usize, ModelError>;
}

/// Maps numeric class codes back to label strings.
pub trait LabelDecoder: Send + Sync {
    fn decode(&self, code: usize) -> Result<String, ModelError>;
}

// ── Artifact bundle ─────────────────────────────────────────────────

/// Read-only handle over the loaded artifacts, built once at startup.
#[derive(Clone)]
pub struct ModelArtifacts {
    word_vec: Arc<dyn TextVectorizer>,
    char_vec: Arc<dyn TextVectorizer>,
    model: Arc<dyn LabelPredictor>,
    labels: Arc<dyn LabelDecoder>,
}

impl ModelArtifacts {
    /// Bundle the four artifacts, checking that their shapes line up.
    pub fn from_parts(
        word_vec: Arc<dyn TextVectorizer>,
        char_vec: Arc<dyn TextVectorizer>,
        model: Arc<dyn LabelPredictor>,
        labels: Arc<dyn LabelDecoder>,
    ) -> Result<Self, ModelError> {
        let combined = word_vec.dimension() + char_vec.dimension() + META_FEATURE_COUNT;
        if combined != model.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: model.n_features(),
                actual: combined,
            });
        }
        Ok(Self {
            word_vec,
            char_vec,
            model,
            labels,
        })
    }

    pub fn vectorize_word(&self, text: &str) -> SparseVector {
        self.word_vec.transform(text)
    }

    pub fn vectorize_char(&self, text: &str) -> SparseVector {
        self.char_vec.transform(text)
    }

    /// Predict a class code, refusing vectors of the wrong width.
    pub fn predict(&self, features: &SparseVector) -> Result<usize, ModelError> {
        let expected = self.model.n_features();
        if features.dimension() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: features.dimension(),
            });
        }
        self.model.predict(features)
    }

    pub fn decode(&self, code: usize) -> Result<String, ModelError> {
        self.labels.decode(code)
    }

    /// Total input width the model expects.
    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("word_dimension", &self.word_vec.dimension())
            .field("char_dimension", &self.char_vec.dimension())
            .field("n_features", &self.model.n_features())
            .finish()
    }
}
