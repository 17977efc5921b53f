//! Expansion of "select all that apply" answers into per-option counts.

use serde::Serialize;
use std::collections::BTreeMap;

/// Separator used by the survey export between chosen options.
pub const DEFAULT_DELIMITER: char = ',';

/// Mention count per option across all answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionCounts(BTreeMap<String, usize>);

impl OptionCounts {
    pub fn get(&self, option: &str) -> Option<usize> {
        self.0.get(option).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_mentions(&self) -> usize {
        self.0.values().sum()
    }

    pub fn as_map(&self) -> &BTreeMap<String, usize> {
        &self.0
    }

    /// Options by descending mention count, ties in option order.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> =
            self.0.iter().map(|(k, &v)| (k.clone(), v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

/// Count options across multi-select answers.
///
/// Missing answers are dropped first; `None` means no answer remained. Tokens
/// are trimmed and empty tokens are never counted.
pub fn expand_options<'a, I>(answers: I, delimiter: char) -> Option<OptionCounts>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts = BTreeMap::new();
    let mut answered = 0usize;

    for answer in answers.into_iter().flatten() {
        answered += 1;
        for token in answer.split(delimiter).map(str::trim) {
            if token.is_empty() {
                continue;
            }
            *counts.entry(token.to_string()).or_insert(0usize) += 1;
        }
    }

    if answered == 0 {
        return None;
    }
    Some(OptionCounts(counts))
}
