use crate::tokenizer::tokenize;
use std::collections::BTreeMap;

/// Normalized term to occurrence count within one chunk.
///
/// Ordered so that persisted documents serialize identically across runs.
pub type TermFrequencyMap = BTreeMap<String, u32>;

pub fn compute_term_frequencies(text: &str) -> TermFrequencyMap {
    let mut frequencies = TermFrequencyMap::new();
    for term in tokenize(text) {
        *frequencies.entry(term).or_insert(0) += 1;
    }
    frequencies
}

/// Cumulative frequency of `query_terms` in `frequencies`; absent terms count 0.
pub fn overlap_score(frequencies: &TermFrequencyMap, query_terms: &[String]) -> u64 {
    query_terms
        .iter()
        .map(|term| u64::from(frequencies.get(term).copied().unwrap_or(0)))
        .sum()
}
