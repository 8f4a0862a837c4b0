//! Aggregation of context windows into per-variable feature records.
//!
//! All windows belonging to the same `(scope, name)` pair merge into one
//! record whose text is the space-joined concatenation of every window, in
//! source order. Records are stored in a `Vec` with a map index, so iteration
//! order is the deterministic first-occurrence order.

use std::collections::HashMap;

use crate::extract::Window;
use crate::scope::ScopeId;

/// One aggregated feature record for a single variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextRecord {
    pub scope_id: ScopeId,
    pub name: String,
    /// Space-joined context tokens of every occurrence, in source order.
    pub text: String,
}

/// Insertion-ordered collection of [`ContextRecord`]s.
#[derive(Debug, Default)]
pub struct Aggregate {
    records: Vec<ContextRecord>,
    index: HashMap<(ScopeId, String), usize>,
}

impl Aggregate {
    /// Merge extracted windows by `(scope, name)`.
    pub fn from_windows(windows: &[Window]) -> Self {
        let mut agg = Self::default();
        for window in windows {
            let key = (window.scope_id, window.name.clone());
            let slot = match agg.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    agg.records.push(ContextRecord {
                        scope_id: window.scope_id,
                        name: window.name.clone(),
                        text: String::new(),
                    });
                    let slot = agg.records.len() - 1;
                    agg.index.insert(key, slot);
                    slot
                }
            };
            let record = &mut agg.records[slot];
            for token in &window.tokens {
                if !record.text.is_empty() {
                    record.text.push(' ');
                }
                record.text.push_str(token);
            }
        }
        agg
    }

    pub fn records(&self) -> &[ContextRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Training-log lines: `<file> ID:<scope>:<name> <context>`, one per
    /// record. Spaces in the file name are replaced by underscores so the
    /// line stays whitespace-splittable.
    pub fn persist_lines(&self, file_name: &str) -> Vec<String> {
        let fname = file_name.replace(' ', "_");
        self.records
            .iter()
            .map(|r| format!("{} ID:{}:{} {}", fname, r.scope_id, r.name, r.text))
            .collect()
    }

    /// Oracle query strings: the persisted format without the file prefix.
    pub fn queries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("ID:{}:{} {}", r.scope_id, r.name, r.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(scope_id: ScopeId, name: &str, tokens: &[&str]) -> Window {
        Window {
            scope_id,
            name: name.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_merges_same_key() {
        let windows = vec![
            window(1, "a", &["START", "var"]),
            window(1, "b", &["=", "1"]),
            window(1, "a", &["+", "END"]),
        ];
        let agg = Aggregate::from_windows(&windows);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.records()[0].text, "START var + END");
        assert_eq!(agg.records()[1].text, "= 1");
    }

    #[test]
    fn test_insertion_order_is_first_occurrence_order() {
        let windows = vec![
            window(2, "z", &["x"]),
            window(1, "a", &["y"]),
            window(2, "z", &["w"]),
        ];
        let agg = Aggregate::from_windows(&windows);
        let names: Vec<&str> = agg.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_same_name_different_scope_kept_apart() {
        let windows = vec![window(1, "x", &["a"]), window(2, "x", &["b"])];
        let agg = Aggregate::from_windows(&windows);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_idempotent_aggregation() {
        let windows = vec![
            window(1, "a", &["START", "var"]),
            window(1, "a", &["+", "END"]),
            window(3, "b", &["f", "{"]),
        ];
        let first = Aggregate::from_windows(&windows);
        let second = Aggregate::from_windows(&windows);
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_persist_line_format() {
        let agg = Aggregate::from_windows(&[window(3, "t", &["START", "var", "=", "1"])]);
        let lines = agg.persist_lines("my bundle.min.js");
        assert_eq!(lines, vec!["my_bundle.min.js ID:3:t START var = 1"]);
        assert_eq!(agg.queries(), vec!["ID:3:t START var = 1"]);
    }
}
