//! Global best-first rename assignment.
//!
//! All variables compete in one max-heap ordered by confidence, so the
//! highest-confidence rename in the whole file claims its name before any
//! lower-confidence rename can take it. Per-variable progress (the next
//! candidate to try) lives outside the heap; heap items only carry enough
//! identity to find it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use namely_parser::Span;
use tracing::{debug, trace};

use crate::oracle::Candidate;
use crate::resolve::Occurrence;
use crate::scope::{RenameOptions, ScopeId, ScopeTree, ROOT_SCOPE};

/// Ranked candidates beyond this depth are never tried.
const MAX_CANDIDATES: usize = 10;

/// Prefix of synthesized fallback names; combined with a global counter and
/// the original name they are guaranteed fresh.
const PLACEHOLDER_PREFIX: &str = "UNK";

/// One variable under assignment: its original name and resolving scope.
#[derive(Debug, Clone)]
pub struct QueryVar {
    pub name: String,
    pub scope_id: ScopeId,
}

/// Heap entry: a candidate name for one variable.
struct Pending {
    confidence: f64,
    name: String,
    var: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Confidence descending; variable index as a deterministic tiebreak.
        self.confidence
            .total_cmp(&other.confidence)
            .then(other.var.cmp(&self.var))
    }
}

/// Assign a committed outcome to every queried variable: an oracle
/// prediction, the unchanged original name, or a synthesized placeholder.
pub fn assign_names(
    tree: &mut ScopeTree,
    vars: &[QueryVar],
    predictions: &[Vec<Candidate>],
    options: &RenameOptions,
) {
    let mut heap = BinaryHeap::new();
    let mut next_to_try = vec![1usize; vars.len()];
    for prediction in predictions.iter() {
        if let Some(first) = prediction.first() {
            heap.push(Pending {
                confidence: first.confidence,
                name: first.name.clone(),
                var: first.index,
            });
        }
    }

    let mut placeholder_counter = 0usize;

    while let Some(item) = heap.pop() {
        // Candidate indices come off the wire; drop anything out of range.
        let (Some(var), Some(candidates)) = (vars.get(item.var), predictions.get(item.var)) else {
            continue;
        };
        let original = &var.name;
        let scope = var.scope_id;

        // `arguments` is never renamed; discard without requeueing.
        if original == "arguments" {
            continue;
        }

        if tree.can_assign(scope, &item.name, original, options) {
            trace!(scope, %original, new = %item.name, confidence = item.confidence, "committing rename");
            tree.commit_rename(scope, original, &item.name);
            continue;
        }

        let tried = next_to_try[item.var];
        if tried >= MAX_CANDIDATES || tried >= candidates.len() {
            // Candidates exhausted: keep the original name if that is still
            // safe, otherwise synthesize a fresh placeholder.
            if tree.can_assign(scope, original, original, options) {
                trace!(scope, %original, "keeping original name");
                tree.commit_rename(scope, original, original);
            } else {
                let placeholder = format!(
                    "{PLACEHOLDER_PREFIX}_{placeholder_counter}_{original}"
                );
                placeholder_counter += 1;
                debug!(scope, %original, %placeholder, "all candidates rejected");
                tree.commit_rename(scope, original, &placeholder);
            }
        } else {
            let next = &candidates[tried];
            next_to_try[item.var] += 1;
            heap.push(Pending {
                confidence: next.confidence,
                name: next.name.clone(),
                var: next.index,
            });
        }
    }
}

/// Build the span-keyed rewrite plan for the final traversal: every
/// occurrence that resolved to a non-root scope looks up its scope's
/// committed replacement; root and unassigned occurrences keep their text.
pub fn rewrite_plan(tree: &ScopeTree, occurrences: &[Occurrence]) -> HashMap<Span, String> {
    let mut plan = HashMap::new();
    for occ in occurrences {
        if occ.scope_id == ROOT_SCOPE {
            continue;
        }
        if let Some(new_name) = tree.committed_name(occ.scope_id, &occ.name) {
            if new_name != occ.name {
                plan.insert(occ.span, new_name.to_string());
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use namely_parser::parse;

    fn candidates(var: usize, ranked: &[(f64, &str)]) -> Vec<Candidate> {
        ranked
            .iter()
            .map(|&(confidence, name)| Candidate {
                confidence,
                name: name.to_string(),
                index: var,
            })
            .collect()
    }

    fn opts() -> RenameOptions {
        RenameOptions::default()
    }

    #[test]
    fn test_best_candidate_committed() {
        let res = resolve(&parse("function f(a) { return a; }").unwrap());
        let mut tree = res.scopes;
        let vars = vec![QueryVar {
            name: "a".into(),
            scope_id: 1,
        }];
        let preds = vec![candidates(0, &[(0.9, "count"), (0.5, "total")])];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(1, "a"), Some("count"));
    }

    #[test]
    fn test_second_candidate_after_collision() {
        // Scenario: "n" collides with an untouched binding, "m" is legal.
        let res = resolve(&parse("function f(a) { var n; return a + n; }").unwrap());
        let mut tree = res.scopes;
        let vars = vec![QueryVar {
            name: "a".into(),
            scope_id: 1,
        }];
        let preds = vec![candidates(0, &[(0.9, "n"), (0.5, "m")])];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(1, "a"), Some("m"));
    }

    #[test]
    fn test_higher_confidence_wins_contested_name() {
        // Both parameters want "n"; the 0.9 one gets it, the other falls
        // back to its next candidate.
        let res = resolve(&parse("function f(a) { function g(b) { return a + b; } }").unwrap());
        let mut tree = res.scopes;
        let vars = vec![
            QueryVar {
                name: "a".into(),
                scope_id: 1,
            },
            QueryVar {
                name: "b".into(),
                scope_id: 2,
            },
        ];
        let preds = vec![
            candidates(0, &[(0.4, "n"), (0.3, "left")]),
            candidates(1, &[(0.9, "n"), (0.2, "right")]),
        ];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(2, "b"), Some("n"));
        // `a` is referenced from g's scope, where "n" is now committed, so
        // its own "n" is rejected and the next candidate lands.
        assert_eq!(tree.committed_name(1, "a"), Some("left"));
    }

    #[test]
    fn test_arguments_never_renamed() {
        let res = resolve(&parse("function f() { return arguments; }").unwrap());
        let mut tree = res.scopes;
        // `arguments` resolves as implicit global normally; force a query for
        // it the way a hostile oracle alignment might.
        let vars = vec![QueryVar {
            name: "arguments".into(),
            scope_id: 1,
        }];
        let preds = vec![candidates(0, &[(0.9, "args")])];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(1, "arguments"), None);
    }

    #[test]
    fn test_exhaustion_keeps_original() {
        // Single candidate that always collides; original name is still safe.
        let res = resolve(&parse("function f(a) { var n; return a + n; }").unwrap());
        let mut tree = res.scopes;
        let vars = vec![QueryVar {
            name: "a".into(),
            scope_id: 1,
        }];
        let preds = vec![candidates(0, &[(0.9, "n")])];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(1, "a"), Some("a"));
    }

    #[test]
    fn test_exhaustion_synthesizes_placeholder() {
        // Every option for f's param collides: its only candidate "t" is
        // claimed by g's param first, and keeping "t" fails for the same
        // reason, so a placeholder is synthesized.
        let res = resolve(&parse("function f(t) { function g(u) { return t + u; } }").unwrap());
        let mut tree = res.scopes;
        let vars = vec![
            QueryVar {
                name: "t".into(),
                scope_id: 1,
            },
            QueryVar {
                name: "u".into(),
                scope_id: 2,
            },
        ];
        // g's param claims "t" first (0.9). Then f's param tries "t" (its
        // only candidate): rejected, falls back to keeping "t": rejected too
        // (committed below along the use chain), so a placeholder appears.
        let preds = vec![
            candidates(0, &[(0.5, "t")]),
            candidates(1, &[(0.9, "t")]),
        ];
        assign_names(&mut tree, &vars, &preds, &opts());
        assert_eq!(tree.committed_name(2, "u"), Some("t"));
        assert_eq!(tree.committed_name(1, "t"), Some("UNK_0_t"));
    }

    #[test]
    fn test_rewrite_plan_spans() {
        let source = "function f(a) { return a; } var a = 1;";
        let ast = parse(source).unwrap();
        let res = resolve(&ast);
        let mut tree = res.scopes;
        let vars = vec![QueryVar {
            name: "a".into(),
            scope_id: 1,
        }];
        let preds = vec![candidates(0, &[(0.9, "count")])];
        assign_names(&mut tree, &vars, &preds, &opts());
        let plan = rewrite_plan(&tree, &res.occurrences);
        // Only the parameter and its use are rewritten, not the global `a`.
        assert_eq!(plan.len(), 2);
        let out = namely_parser::Codegen::with_renames(&ast, plan).generate();
        assert!(out.contains("function f(count)"), "{out}");
        assert!(out.contains("return count;"), "{out}");
        assert!(out.contains("var a = 1;"), "{out}");
    }
}
