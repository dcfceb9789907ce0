//! Keyword/pattern override layer evaluated on preprocessed text.
//!
//! Rules are checked in order and the first match wins:
//! 1. Positive keyword (accepted, hired, ...) → Ham, overriding everything
//! 2. Two+ spam keywords, money, a link, or two+ `!` → Spam
//! 3. One spam keyword plus money, a link, or any `!` → Spam
//!
//! If nothing matches, the caller falls through to the statistical model.

use tracing::debug;

use super::types::{Decision, HeuristicSignals, Label};

/// Spam keywords, matched as substrings.
pub const DEFAULT_SPAM_KEYWORDS: &[&str] = &[
    "win",
    "winner",
    "prize",
    "reward",
    "claim",
    "offer",
    "free",
    "urgent",
    "selected",
    "brand new",
    "click",
    "limited",
    "gift",
    "survey",
    "lottery",
    "credit card",
    "pre-approved",
    "discount",
    "deal",
    "money",
    "earn",
    "opportunity",
    "verify",
    "account",
    "update",
];

/// Keywords that mark a message as legitimate regardless of other signals.
pub const DEFAULT_POSITIVE_KEYWORDS: &[&str] = &["accepted", "hired", "enrolled", "passed", "approved"];

const MONEY_MARKER: &str = "<money>";
const LINK_MARKERS: &[&str] = &["http", "www."];

/// Heuristic rules engine.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    spam_keywords: Vec<String>,
    positive_keywords: Vec<String>,
}

impl RulesEngine {
    /// Create a rules engine with the default keyword lists.
    pub fn default_rules() -> Self {
        Self {
            spam_keywords: DEFAULT_SPAM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            positive_keywords: DEFAULT_POSITIVE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    /// Create an engine with no keywords (for testing).
    ///
    /// Money, link, and `!` signals still apply.
    pub fn empty() -> Self {
        Self {
            spam_keywords: Vec::new(),
            positive_keywords: Vec::new(),
        }
    }

    /// Add a spam keyword. Keywords are matched against lowercased text.
    pub fn add_spam_keyword(&mut self, keyword: &str) {
        self.spam_keywords.push(keyword.to_lowercase());
    }

    /// Add a positive (force-ham) keyword.
    pub fn add_positive_keyword(&mut self, keyword: &str) {
        self.positive_keywords.push(keyword.to_lowercase());
    }

    pub fn spam_keywords(&self) -> &[String] {
        &self.spam_keywords
    }

    pub fn positive_keywords(&self) -> &[String] {
        &self.positive_keywords
    }

    /// Compute the heuristic signals for preprocessed text.
    pub fn signals(&self, text: &str) -> HeuristicSignals {
        // Case-sensitive: the tokenizer's uppercase `<MONEY>` does not match.
        let has_money = text.contains(MONEY_MARKER);
        let has_link = LINK_MARKERS.iter().any(|m| text.contains(m));
        let exclaim_count = text.matches('!').count();
        let spam_hits = self
            .spam_keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count();
        let positive_hit = self
            .positive_keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .cloned();

        HeuristicSignals {
            has_money,
            has_link,
            exclaim_count,
            spam_hits,
            positive_hit,
        }
    }

    /// Apply the ordered rules to precomputed signals.
    ///
    /// Returns `None` when no rule fires (fall through to the model).
    pub fn decide(signals: &HeuristicSignals) -> Option<(Label, Decision)> {
        if let Some(ref keyword) = signals.positive_hit {
            debug!(keyword = %keyword, "Positive keyword forces ham");
            return Some((Label::Ham, Decision::PositiveKeyword));
        }

        if signals.spam_hits >= 2
            || signals.has_money
            || signals.has_link
            || signals.exclaim_count >= 2
        {
            debug!(?signals, "Strong spam signal");
            return Some((Label::Spam, Decision::StrongSpamSignal));
        }

        if signals.spam_hits >= 1
            && (signals.has_money || signals.has_link || signals.exclaim_count > 0)
        {
            debug!(?signals, "Spam keyword with supporting signal");
            return Some((Label::Spam, Decision::KeywordWithSignal));
        }

        None
    }

    /// Evaluate preprocessed text against all rules.
    pub fn evaluate(&self, text: &str) -> Option<(Label, Decision)> {
        Self::decide(&self.signals(text))
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::normalize::preprocess;

    fn eval(raw: &str) -> Option<(Label, Decision)> {
        RulesEngine::default_rules().evaluate(&preprocess(raw))
    }

    #[test]
    fn positive_keyword_overrides_strong_spam() {
        let result = eval("Your loan is APPROVED, get it FREE now!!");
        assert_eq!(result, Some((Label::Ham, Decision::PositiveKeyword)));
    }

    #[test]
    fn positive_keyword_overrides_links_and_money() {
        let result = eval("You have been hired! Click http://x.io to claim your $500 prize!");
        assert_eq!(result, Some((Label::Ham, Decision::PositiveKeyword)));
    }

    #[test]
    fn two_spam_keywords_is_spam() {
        assert_eq!(
            eval("claim your prize"),
            Some((Label::Spam, Decision::StrongSpamSignal))
        );
    }

    #[test]
    fn link_alone_is_spam() {
        assert_eq!(
            eval("see www.example.com"),
            Some((Label::Spam, Decision::StrongSpamSignal))
        );
    }

    #[test]
    fn link_with_keyword_is_spam() {
        let result = eval("click here http://example.com");
        assert!(matches!(result, Some((Label::Spam, _))));
    }

    #[test]
    fn money_amount_alone_falls_through() {
        assert_eq!(eval("it costs $100 now"), None);
        assert_eq!(eval("claim $100 now"), None);
    }

    #[test]
    fn lowercase_money_marker_is_a_strong_signal() {
        let engine = RulesEngine::default_rules();
        let signals = engine.signals("pay <money> today");
        assert!(signals.has_money);
        assert_eq!(
            RulesEngine::decide(&signals),
            Some((Label::Spam, Decision::StrongSpamSignal))
        );
    }

    #[test]
    fn two_exclamations_alone_is_spam() {
        assert_eq!(
            eval("see you soon!!"),
            Some((Label::Spam, Decision::StrongSpamSignal))
        );
    }

    #[test]
    fn one_keyword_with_one_exclamation_is_spam() {
        assert_eq!(
            eval("act now, it's urgent!"),
            Some((Label::Spam, Decision::KeywordWithSignal))
        );
    }

    #[test]
    fn one_keyword_without_support_falls_through() {
        assert_eq!(eval("what a great deal"), None);
    }

    #[test]
    fn one_exclamation_without_keyword_falls_through() {
        assert_eq!(eval("see you soon!"), None);
    }

    #[test]
    fn neutral_message_falls_through() {
        assert_eq!(eval("hello, how are you?"), None);
    }

    #[test]
    fn keywords_count_as_substrings() {
        // "winner" contains "win": both keywords hit.
        let signals = RulesEngine::default_rules().signals("winner");
        assert_eq!(signals.spam_hits, 2);
    }

    #[test]
    fn uppercase_money_placeholder_is_not_has_money() {
        let text = preprocess("pay $20");
        assert!(text.contains("<MONEY>"));
        assert!(!RulesEngine::default_rules().signals(&text).has_money);
    }

    #[test]
    fn non_ascii_currency_is_stripped_before_tokenizing() {
        // Normalization drops `£`, so only the number survives.
        let text = preprocess("pay £20");
        assert!(text.contains("<NUM>"));
        assert!(!RulesEngine::default_rules().signals(&text).has_money);
    }

    #[test]
    fn numbers_are_not_money() {
        let signals = RulesEngine::default_rules().signals(&preprocess("meet at 5"));
        assert!(!signals.has_money);
    }

    #[test]
    fn empty_engine_still_checks_structural_signals() {
        let engine = RulesEngine::empty();
        assert_eq!(engine.evaluate("free prize"), None);
        assert_eq!(
            engine.evaluate("wow!!"),
            Some((Label::Spam, Decision::StrongSpamSignal))
        );
    }

    #[test]
    fn custom_keywords() {
        let mut engine = RulesEngine::empty();
        engine.add_spam_keyword("Crypto");
        engine.add_positive_keyword("Invoice");
        assert_eq!(
            engine.evaluate("crypto!"),
            Some((Label::Spam, Decision::KeywordWithSignal))
        );
        assert_eq!(
            engine.evaluate("your invoice!!"),
            Some((Label::Ham, Decision::PositiveKeyword))
        );
    }

    #[test]
    fn empty_text_falls_through() {
        assert_eq!(eval(""), None);
        assert_eq!(
            RulesEngine::default_rules().signals(""),
            HeuristicSignals::default()
        );
    }
}
