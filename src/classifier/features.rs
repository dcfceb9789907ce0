//! Hand-engineered meta-features appended to the vectorizer output.

use super::model::SparseVector;
use super::normalize::is_separator;

/// Number of meta-features per message.
pub const META_FEATURE_COUNT: usize = 7;

/// Fixed-order meta-features for one message.
///
/// The field order is the column order the model was trained with:
/// `[has_money, has_link, exclaim_count, word_count, has_congrat, has_free, has_win]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetaFeatures {
    pub has_money: bool,
    pub has_link: bool,
    pub exclaim_count: usize,
    pub word_count: usize,
    pub has_congrat: bool,
    pub has_free: bool,
    pub has_win: bool,
}

impl MetaFeatures {
    /// Compute the features for a single message.
    pub fn from_text(text: &str) -> Self {
        let lc = text.to_lowercase();
        Self {
            has_money: lc.contains("<money>"),
            has_link: lc.contains("http") || lc.contains("www."),
            exclaim_count: lc.matches('!').count(),
            word_count: lc.split(is_separator).filter(|w| !w.is_empty()).count(),
            has_congrat: lc.contains("congrat"),
            has_free: lc.contains("free"),
            has_win: lc.contains("win") || lc.contains("winner"),
        }
    }

    /// The 7-tuple in model column order.
    pub fn to_row(&self) -> [i64; META_FEATURE_COUNT] {
        [
            self.has_money as i64,
            self.has_link as i64,
            self.exclaim_count as i64,
            self.word_count as i64,
            self.has_congrat as i64,
            self.has_free as i64,
            self.has_win as i64,
        ]
    }

    /// Sparse form, ready to be concatenated after the text features.
    pub fn to_sparse(&self) -> SparseVector {
        SparseVector::from_dense(self.to_row().iter().map(|&v| v as f64))
    }
}

/// Meta-feature matrix of shape `(texts.len(), 7)`. Rows are independent.
pub fn extract_meta<I, S>(texts: I) -> Vec<[i64; META_FEATURE_COUNT]>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| MetaFeatures::from_text(t.as_ref()).to_row())
        .collect()
}
