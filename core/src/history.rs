//! Per-age narrative log of a life.

use crate::types::Age;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeHistory(BTreeMap<Age, Vec<String>>);

impl AgeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append lines under `age`. Lines recorded earlier for the same age
    /// are kept.
    pub fn record(&mut self, age: Age, lines: impl IntoIterator<Item = String>) {
        let entry = self.0.entry(age).or_default();
        entry.extend(lines);
    }

    pub fn lines_at(&self, age: Age) -> &[String] {
        self.0.get(&age).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The last `n` lines across all ages, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let mut lines: Vec<String> = self.0.values().rev().flat_map(|v| v.iter().rev()).take(n).cloned().collect();
        lines.reverse();
        lines
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Age, &Vec<String>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_spans_ages() {
        let mut h = AgeHistory::new();
        h.record(1, vec!["a".to_string(), "b".to_string()]);
        h.record(2, vec!["c".to_string()]);
        assert_eq!(h.recent(2), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(h.recent(10).len(), 3);
    }
}
