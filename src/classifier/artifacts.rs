//! JSON-backed model artifacts: TF-IDF vectorizers, a linear classifier, and
//! a label encoder, as exported from the training pipeline.
//!
//! Expected files in the model directory:
//! - `word_vectorizer.json`
//! - `char_vectorizer.json`
//! - `spam_classifier_model.json`
//! - `label_encoder.json`

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelError;

use super::model::{LabelDecoder, LabelPredictor, ModelArtifacts, SparseVector, TextVectorizer};

pub const WORD_VECTORIZER_FILE: &str = "word_vectorizer.json";
pub const CHAR_VECTORIZER_FILE: &str = "char_vectorizer.json";
pub const MODEL_FILE: &str = "spam_classifier_model.json";
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s\s+").unwrap());

// ── TF-IDF vectorizer ───────────────────────────────────────────────

/// How text is split into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Word n-grams over `\b\w\w+\b` tokens.
    Word,
    /// Character n-grams over the whole text.
    Char,
    /// Character n-grams inside space-padded words.
    CharWb,
}

/// Row normalization applied after idf weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_true() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// TF-IDF vectorizer with a frozen vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    pub analyzer: Analyzer,
    pub ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    pub lowercase: bool,
    /// Term → column index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Check internal consistency; `name` is used in error messages.
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!("bad ngram_range ({min_n}, {max_n})")));
        }
        if self.vocabulary.len() != self.idf.len() {
            return Err(invalid(format!(
                "vocabulary has {} terms but idf has {} entries",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.vocabulary.len());
        for (term, &idx) in &self.vocabulary {
            if idx >= self.idf.len() {
                return Err(invalid(format!("term {term:?} maps to out-of-range column {idx}")));
            }
            if !seen.insert(idx) {
                return Err(invalid(format!("column {idx} is assigned twice")));
            }
        }
        Ok(())
    }

    /// Extract the raw terms (with repeats) for a document.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        match self.analyzer {
            Analyzer::Word => self.word_ngrams(&text),
            Analyzer::Char => self.char_ngrams(&text),
            Analyzer::CharWb => self.char_wb_ngrams(&text),
        }
    }

    fn word_ngrams(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = WORD_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    fn char_ngrams(&self, text: &str) -> Vec<String> {
        let collapsed = WHITESPACE_RUN.replace_all(text, " ");
        let chars: Vec<char> = collapsed.chars().collect();
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(chars.len()) {
            for window in chars.windows(n) {
                terms.push(window.iter().collect());
            }
        }
        terms
    }

    fn char_wb_ngrams(&self, text: &str) -> Vec<String> {
        let collapsed = WHITESPACE_RUN.replace_all(text, " ");
        let (min_n, max_n) = self.ngram_range;

        let mut terms = Vec::new();
        for word in collapsed.split_whitespace() {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            for n in min_n..=max_n {
                if padded.len() <= n {
                    // A short word counts once, as itself.
                    terms.push(padded.iter().collect());
                    break;
                }
                for window in padded.windows(n) {
                    terms.push(window.iter().collect());
                }
            }
        }
        terms
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx])
            })
            .collect();

        let scale = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 1.0,
        };
        if scale > 0.0 {
            for (_, v) in &mut entries {
                *v /= scale;
            }
        }

        SparseVector::from_entries(self.dimension(), entries)
    }
}

// ── Linear model ────────────────────────────────────────────────────

/// Linear classifier (logistic regression / linear SVM export).
///
/// A single coefficient row is a binary model: `classes[1]` when the decision
/// value is positive, else `classes[0]`. Several rows are one-vs-rest and the
/// highest-scoring row wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    pub classes: Vec<usize>,
}

impl LinearModel {
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        let Some(first) = self.coef.first() else {
            return Err(invalid("coef is empty".into()));
        };
        if self.coef.iter().any(|row| row.len() != first.len()) {
            return Err(invalid("coef rows differ in length".into()));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(invalid(format!(
                "{} coef rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }
        let expected_classes = if self.coef.len() == 1 { 2 } else { self.coef.len() };
        if self.classes.len() != expected_classes {
            return Err(invalid(format!(
                "expected {expected_classes} classes, found {}",
                self.classes.len()
            )));
        }
        Ok(())
    }

    /// Per-row decision values.
    pub fn decision_function(&self, features: &SparseVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| features.dot(row) + b)
            .collect()
    }
}

impl LabelPredictor for LinearModel {
    fn n_features(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    fn predict(&self, features: &SparseVector) -> Result<usize, ModelError> {
        if features.dimension() != self.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features(),
                actual: features.dimension(),
            });
        }
        let scores = self.decision_function(features);
        let position = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            scores
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &s)| {
                    if s > best.1 { (i, s) } else { best }
                })
                .0
        };
        self.classes
            .get(position)
            .copied()
            .ok_or(ModelError::UnknownLabelCode {
                code: position,
                classes: self.classes.len(),
            })
    }
}

// ── Label encoder ───────────────────────────────────────────────────

/// Class-code → label-name table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn validate(&self, name: &str) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::InvalidArtifact {
                name: name.to_string(),
                reason: "no classes".into(),
            });
        }
        Ok(())
    }
}

impl LabelDecoder for LabelEncoder {
    fn decode(&self, code: usize) -> Result<String, ModelError> {
        self.classes
            .get(code)
            .map(|c| c.to_lowercase())
            .ok_or(ModelError::UnknownLabelCode {
                code,
                classes: self.classes.len(),
            })
    }
}

// ── Loading ─────────────────────────────────────────────────────────

fn read_artifact<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ModelError> {
    let path = dir.join(file);
    let content = std::fs::read_to_string(&path).map_err(|source| ModelError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelError::Parse { path, source })
}

impl ModelArtifacts {
    /// Load and cross-check all four artifacts from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let word: TfidfVectorizer = read_artifact(dir, WORD_VECTORIZER_FILE)?;
        word.validate(WORD_VECTORIZER_FILE)?;
        let chars: TfidfVectorizer = read_artifact(dir, CHAR_VECTORIZER_FILE)?;
        chars.validate(CHAR_VECTORIZER_FILE)?;
        let model: LinearModel = read_artifact(dir, MODEL_FILE)?;
        model.validate(MODEL_FILE)?;
        let labels: LabelEncoder = read_artifact(dir, LABEL_ENCODER_FILE)?;
        labels.validate(LABEL_ENCODER_FILE)?;

        info!(
            dir = %dir.display(),
            word_terms = word.dimension(),
            char_terms = chars.dimension(),
            n_features = model.n_features(),
            classes = ?labels.classes,
            "Loaded model artifacts"
        );

        Self::from_parts(
            Arc::new(word),
            Arc::new(chars),
            Arc::new(model),
            Arc::new(labels),
        )
    }
}
