//! Text normalization applied to every message before feature extraction.
//!
//! The step order matches the pipeline the model artifacts were trained with:
//! 1. NFKC normalization
//! 2. Typographic quote/dash folding
//! 3. Non-ASCII stripping (each run becomes one space)
//! 4. Lowercase + trim
//!
//! followed by currency and number placeholder substitution.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Placeholder substituted for currency amounts.
pub const MONEY_TOKEN: &str = " <MONEY> ";
/// Placeholder substituted for standalone numbers.
pub const NUM_TOKEN: &str = " <NUM> ";

static NON_ASCII_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\x00-\x7F]+").unwrap());

static MONEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$|₱|£|€)\s?\d+[\d,]*").unwrap());

static NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+(\.\d+)?\b").unwrap());

/// Whitespace as the training pipeline saw it: ASCII blanks plus the
/// information separators `\x1c`..`\x1f`.
pub fn is_separator(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\x1f'
    )
}

/// Canonicalize raw input. Idempotent.
pub fn normalize(raw: &str) -> String {
    let composed: String = raw.nfkc().collect();

    let folded: String = composed
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '`' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();

    let ascii = NON_ASCII_RUN.replace_all(&folded, " ");

    ascii.to_ascii_lowercase().trim_matches(is_separator).to_string()
}

/// Replace currency amounts with `<MONEY>`, then remaining numbers with `<NUM>`.
///
/// Money must go first: the number rule would otherwise consume the digits
/// of an amount and the currency signal would be lost.
pub fn tokenize_currency_and_numbers(text: &str) -> String {
    let with_money = MONEY_RE.replace_all(text, MONEY_TOKEN);
    NUM_RE.replace_all(&with_money, NUM_TOKEN).into_owned()
}

/// Full preprocessing: [`normalize`] then [`tokenize_currency_and_numbers`].
pub fn preprocess(raw: &str) -> String {
    tokenize_currency_and_numbers(&normalize(raw))
}
