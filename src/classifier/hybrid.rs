//! Hybrid classifier: statistical model plus the heuristic override layer.

use tracing::debug;

use crate::error::ClassifyError;

use super::features::MetaFeatures;
use super::model::ModelArtifacts;
use super::normalize::preprocess;
use super::rules::RulesEngine;
use super::types::{Decision, Label, Verdict};

/// Classifies raw messages as spam or ham.
///
/// Holds the read-only model artifacts; cheap to clone and safe to share
/// across threads.
#[derive(Debug, Clone)]
pub struct HybridClassifier {
    artifacts: ModelArtifacts,
    rules: RulesEngine,
}

impl HybridClassifier {
    /// Classifier with the default rule set.
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self::with_rules(artifacts, RulesEngine::default_rules())
    }

    pub fn with_rules(artifacts: ModelArtifacts, rules: RulesEngine) -> Self {
        Self { artifacts, rules }
    }

    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    /// The statistical model's own label for preprocessed text.
    pub fn model_label(&self, text: &str) -> Result<Label, ClassifyError> {
        let features = self
            .artifacts
            .vectorize_word(text)
            .hstack(&self.artifacts.vectorize_char(text))
            .hstack(&MetaFeatures::from_text(text).to_sparse());

        let code = self.artifacts.predict(&features)?;
        let name = self.artifacts.decode(code)?;
        Ok(name.parse()?)
    }

    /// Classify a raw message.
    ///
    /// The model always runs, so a broken model fails the request even when
    /// a rule would have decided it.
    pub fn classify(&self, raw: &str) -> Result<Verdict, ClassifyError> {
        let text = preprocess(raw);

        let model_label = self.model_label(&text)?;
        let signals = self.rules.signals(&text);

        let (label, decision) =
            RulesEngine::decide(&signals).unwrap_or((model_label, Decision::Model));

        debug!(
            label = %label,
            model_label = %model_label,
            decision = decision.label(),
            spam_hits = signals.spam_hits,
            "Classified message"
        );

        Ok(Verdict {
            label,
            model_label,
            decision,
            signals,
        })
    }

    /// Classify a raw message, returning only the label.
    pub fn classify_label(&self, raw: &str) -> Result<Label, ClassifyError> {
        self.classify(raw).map(|v| v.label)
    }
}
