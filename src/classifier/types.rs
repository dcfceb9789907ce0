//! Shared types for the classification core.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ── Label ───────────────────────────────────────────────────────────

/// Final classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Ham => "ham",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ModelError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(Self::Spam),
            "ham" => Ok(Self::Ham),
            _ => Err(ModelError::UnknownLabel(s.to_string())),
        }
    }
}

// ── Decision ────────────────────────────────────────────────────────

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// A positive keyword was present; forces `ham`.
    PositiveKeyword,
    /// Two or more spam keywords, money, a link, or two or more `!`.
    StrongSpamSignal,
    /// One spam keyword together with money, a link, or an `!`.
    KeywordWithSignal,
    /// No rule fired; the statistical model's label was used.
    Model,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PositiveKeyword => "positive_keyword",
            Self::StrongSpamSignal => "strong_spam_signal",
            Self::KeywordWithSignal => "keyword_with_signal",
            Self::Model => "model",
        }
    }
}

// ── Heuristic signals ───────────────────────────────────────────────

/// Signals the rules engine computes from preprocessed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicSignals {
    pub has_money: bool,
    pub has_link: bool,
    pub exclaim_count: usize,
    /// Number of distinct spam keywords found as substrings.
    pub spam_hits: usize,
    /// First positive keyword found, if any.
    pub positive_hit: Option<String>,
}

// ── Verdict ─────────────────────────────────────────────────────────

/// Result of running a message through the hybrid classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// What the statistical model alone predicted.
    pub model_label: Label,
    pub decision: Decision,
    pub signals: HeuristicSignals,
}
