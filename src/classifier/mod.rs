//! Spam/ham classification core.
//!
//! Every message flows through:
//! 1. `normalize::preprocess()`: Unicode/ASCII normalization + placeholder tokens
//! 2. `HybridClassifier::model_label()`: word/char TF-IDF + meta-features → linear model
//! 3. `RulesEngine::decide()`: keyword/pattern overrides, first match wins
//!
//! The model artifacts are loaded once at startup and shared read-only.

pub mod artifacts;
pub mod features;
pub mod hybrid;
pub mod model;
pub mod normalize;
pub mod rules;
pub mod types;

pub use artifacts::{LabelEncoder, LinearModel, TfidfVectorizer};
pub use features::{MetaFeatures, extract_meta};
pub use hybrid::HybridClassifier;
pub use model::{LabelDecoder, LabelPredictor, ModelArtifacts, SparseVector, TextVectorizer};
pub use normalize::{normalize, preprocess, tokenize_currency_and_numbers};
pub use rules::RulesEngine;
pub use types::{Decision, HeuristicSignals, Label, Verdict};
