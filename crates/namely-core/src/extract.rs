//! Context window extraction.
//!
//! For every eligible identifier occurrence, builds a fixed-width window of
//! the surrounding tokens: `width` to the left, `width` to the right, with
//! `START`/`END` sentinels past the stream boundaries. Identifier tokens are
//! tagged with the scope they resolved to so the oracle can tell apart
//! same-named variables; parentheses and member-access dots are skipped
//! without consuming a slot.

use std::collections::HashMap;

use namely_parser::{Span, Token, TokenKind};

use crate::resolve::Occurrence;
use crate::scope::{ScopeId, ROOT_SCOPE};

/// Default context half-width.
pub const DEFAULT_WIDTH: usize = 5;

/// Sentinel emitted for positions before the first token.
pub const START: &str = "START";
/// Sentinel emitted for positions past the last token.
pub const END: &str = "END";

/// Names that are globals in every environment; never extracted and never
/// tagged with a scope.
const NON_BINDABLE: [&str; 3] = ["undefined", "NaN", "Infinity"];

/// One extracted context window.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Scope the occurrence resolved to.
    pub scope_id: ScopeId,
    /// The occurrence's source name.
    pub name: String,
    /// Exactly `2 * width` context tokens in source order.
    pub tokens: Vec<String>,
}

/// Extract a window per eligible occurrence, in source order.
///
/// Eligible: resolved to a non-root scope and not a property access (not
/// preceded by `.` in the token stream).
pub fn extract(
    source: &str,
    tokens: &[Token],
    occurrences: &[Occurrence],
    width: usize,
) -> Vec<Window> {
    let index_of_span: HashMap<Span, usize> = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| (t.span, i))
        .collect();

    // Transfer resolved scope ids onto the token stream so neighbors can be
    // tagged even when the neighbor is not itself eligible.
    let mut token_scopes: Vec<Option<ScopeId>> = vec![None; tokens.len()];
    for occ in occurrences {
        if NON_BINDABLE.contains(&occ.name.as_str()) {
            continue;
        }
        if let Some(&i) = index_of_span.get(&occ.span) {
            token_scopes[i] = Some(occ.scope_id);
        }
    }

    let mut windows = Vec::new();
    for occ in occurrences {
        if NON_BINDABLE.contains(&occ.name.as_str()) {
            continue;
        }
        if occ.scope_id == ROOT_SCOPE {
            continue;
        }
        let Some(&index) = index_of_span.get(&occ.span) else {
            continue;
        };
        if is_dot(tokens, index as isize - 1) {
            continue;
        }

        let mut left = Vec::with_capacity(width);
        let mut j = index as isize - 1;
        while left.len() < width {
            append_token(&mut left, source, tokens, &token_scopes, j);
            j -= 1;
        }
        left.reverse();

        let mut ctx = left;
        let mut j = index as isize + 1;
        while ctx.len() < 2 * width {
            append_token(&mut ctx, source, tokens, &token_scopes, j);
            j += 1;
        }

        windows.push(Window {
            scope_id: occ.scope_id,
            name: occ.name.clone(),
            tokens: ctx,
        });
    }
    windows
}

fn is_dot(tokens: &[Token], j: isize) -> bool {
    j >= 0
        && tokens
            .get(j as usize)
            .map(|t| matches!(t.kind, TokenKind::Dot))
            .unwrap_or(false)
}

/// Append the representation of the token at position `j`, or nothing if the
/// token is a skipped structural token (parens, dots).
fn append_token(
    out: &mut Vec<String>,
    source: &str,
    tokens: &[Token],
    token_scopes: &[Option<ScopeId>],
    j: isize,
) {
    if j < 0 {
        out.push(START.to_string());
        return;
    }
    let Some(token) = tokens.get(j as usize) else {
        out.push(END.to_string());
        return;
    };
    match &token.kind {
        TokenKind::Identifier(text) if !is_dot(tokens, j - 1) => {
            let tag = match token_scopes[j as usize] {
                Some(scope) => format!("ID:{scope}:{text}"),
                None => format!("ID:-1:{text}"),
            };
            out.push(tag);
        }
        TokenKind::LParen | TokenKind::RParen | TokenKind::Dot => {}
        _ => {
            let text = token.text(source);
            // Defensive: literal text with embedded whitespace (templates,
            // multi-line strings) keeps only its first fragment.
            let first = text.split_whitespace().next().unwrap_or("");
            out.push(first.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use namely_parser::{parse, tokenize};

    fn extract_src(source: &str, width: usize) -> Vec<Window> {
        let ast = parse(source).unwrap();
        let tokens = tokenize(source);
        let res = resolve(&ast);
        extract(source, &tokens, &res.occurrences, width)
    }

    #[test]
    fn test_window_size_invariant() {
        for window in extract_src("function f(a,b){return a+b;}", 5) {
            assert_eq!(window.tokens.len(), 10);
        }
        for window in extract_src("x => x + 1;", 2) {
            assert_eq!(window.tokens.len(), 4);
        }
    }

    #[test]
    fn test_start_sentinels_at_file_head() {
        // The parameter is the very first token; with W=2 the left context is
        // exactly two START sentinels.
        let windows = extract_src("x => x + 1;", 2);
        let param = &windows[0];
        assert_eq!(param.scope_id, 1);
        assert_eq!(&param.tokens[0..2], &[START.to_string(), START.to_string()]);
        assert_eq!(&param.tokens[2..], &["=>".to_string(), "ID:1:x".to_string()]);
    }

    #[test]
    fn test_scenario_parameters_and_siblings() {
        // `a` inside the body resolves to scope 1; its window tags the
        // sibling parameter and keeps `return`/`+` while dropping parens.
        let windows = extract_src("function f(a,b){return a+b;}", 5);
        let body_a = windows
            .iter()
            .filter(|w| w.name == "a")
            .last()
            .unwrap();
        assert_eq!(body_a.scope_id, 1);
        assert!(body_a.tokens.contains(&"ID:1:b".to_string()));
        assert!(body_a.tokens.contains(&"return".to_string()));
        assert!(body_a.tokens.contains(&"+".to_string()));
        assert!(!body_a.tokens.iter().any(|t| t == "(" || t == ")"));
        // The hoisted function name tags with the root scope.
        assert!(body_a.tokens.iter().any(|t| t == "ID:0:f" || t == "{"));
    }

    #[test]
    fn test_root_scope_occurrences_excluded() {
        // Globals (scope 0) produce no window of their own.
        let windows = extract_src("var g = 1; function f(a) { return a; }", 5);
        assert!(windows.iter().all(|w| w.name != "g"));
        assert!(windows.iter().any(|w| w.name == "a"));
    }

    #[test]
    fn test_property_access_excluded_but_tagged_neighbors() {
        let windows = extract_src("function f(a) { return a.length + a; }", 5);
        // No window for `length`; the `a` occurrences are extracted.
        assert!(windows.iter().all(|w| w.name != "length"));
        let a_windows: Vec<_> = windows.iter().filter(|w| w.name == "a").collect();
        assert_eq!(a_windows.len(), 3);
        // A dot-preceded identifier appearing inside a window is emitted as
        // plain text, not an ID tag.
        assert!(a_windows
            .iter()
            .any(|w| w.tokens.contains(&"length".to_string())));
        assert!(a_windows
            .iter()
            .all(|w| !w.tokens.iter().any(|t| t.contains(":length"))));
    }

    #[test]
    fn test_unresolved_identifier_marker() {
        // Object keys are identifier tokens with no resolution: `-1` marker.
        let windows = extract_src("function f(a) { return {key: a}; }", 5);
        let body_a = windows.iter().filter(|w| w.name == "a").last().unwrap();
        assert!(body_a.tokens.contains(&"ID:-1:key".to_string()));
    }

    #[test]
    fn test_non_bindable_names_excluded() {
        let windows = extract_src("function f(a) { return a === undefined; }", 5);
        assert!(windows.iter().all(|w| w.name != "undefined"));
    }

    #[test]
    fn test_string_literal_kept_with_quotes() {
        let windows = extract_src("function f(a) { return a + 'px'; }", 5);
        let body_a = windows.iter().filter(|w| w.name == "a").last().unwrap();
        assert!(body_a.tokens.contains(&"'px'".to_string()));
    }
}
