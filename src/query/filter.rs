use crate::query::compile::PatternQuery;
use crate::query::cursor::{Capture, QueryMatch};
use tracing::trace;

/// A match after predicate filtering.
///
/// Predicates gate whole matches; they never drop individual captures. A
/// rejected match has no captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredMatch<'tree> {
    pub id: u32,
    pub pattern_index: usize,
    pub captures: Vec<Capture<'tree>>,
    accepted: bool,
}

impl<'tree> FilteredMatch<'tree> {
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn is_rejected(&self) -> bool {
        !self.accepted
    }

    /// The captures, or `None` when the match was rejected.
    pub fn into_captures(self) -> Option<Vec<Capture<'tree>>> {
        self.accepted.then_some(self.captures)
    }
}

impl PatternQuery {
    /// Evaluate the predicates of `m`'s pattern against `source`.
    pub fn filter<'tree>(&self, m: &QueryMatch<'tree>, source: &[u8]) -> FilteredMatch<'tree> {
        let accepted = self.satisfies(m, source);
        FilteredMatch {
            id: m.id,
            pattern_index: m.pattern_index,
            captures: if accepted {
                m.captures.clone()
            } else {
                Vec::new()
            },
            accepted,
        }
    }

    /// Whether every predicate of `m`'s pattern holds. Stops at the first
    /// failure.
    pub fn satisfies(&self, m: &QueryMatch<'_>, source: &[u8]) -> bool {
        let predicates = self.predicates(m.pattern_index);
        if predicates.is_empty() {
            return true;
        }

        let failed = predicates
            .iter()
            .position(|p| !p.evaluate(&m.captures, source));
        if let Some(index) = failed {
            trace!(
                match_id = m.id,
                pattern = m.pattern_index,
                predicate = index,
                "match rejected by predicate"
            );
        }
        failed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builtin;
    use crate::query::MatchCursor;
    use crate::ts::SyntaxParser;

    fn filtered(query_source: &str, source: &[u8]) -> Vec<(bool, Vec<String>)> {
        let grammar = builtin::rust();
        let tree = SyntaxParser::new(&grammar)
            .unwrap()
            .parse(source, None, None)
            .unwrap();
        let query = PatternQuery::new(&grammar, query_source).unwrap();
        let mut cursor = MatchCursor::new();
        cursor
            .matches(&query, tree.root_node())
            .map(|m| {
                let f = query.filter(&m, source);
                let texts = f
                    .captures
                    .iter()
                    .map(|c| String::from_utf8_lossy(c.text(source)).into_owned())
                    .collect();
                (f.is_accepted(), texts)
            })
            .collect()
    }

    #[test]
    fn no_predicates_passes_everything() {
        let results = filtered("(identifier) @id", b"fn a() { b; }");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(ok, caps)| *ok && caps.len() == 1));
    }

    #[test]
    fn eq_literal_gates_matches() {
        let results = filtered(
            r#"((identifier) @id (#eq? @id "main"))"#,
            b"fn main() {} fn other() {}",
        );
        assert_eq!(
            results,
            [
                (true, vec!["main".to_string()]),
                (false, Vec::new()),
            ]
        );
    }

    #[test]
    fn eq_between_captures() {
        let query = r#"(let_declaration pattern: (identifier) @a value: (identifier) @b (#eq? @a @b))"#;
        let results = filtered(query, b"fn f() { let x = x; let y = z; }");
        assert_eq!(results[0], (true, vec!["x".to_string(), "x".to_string()]));
        assert!(!results[1].0);

        let negated = query.replace("#eq?", "#not-eq?");
        let results = filtered(&negated, b"fn f() { let x = x; let y = z; }");
        assert!(!results[0].0);
        assert!(results[1].0);
    }

    #[test]
    fn match_requires_every_occurrence() {
        let query = r#"((use_list (identifier) @name (identifier) @name) (#match? @name "^[a-z]+$"))"#;
        let results = filtered(query, b"use m::{a, b};\nuse m::{c, D};");
        assert!(results[0].0);
        assert!(!results[1].0);

        let negated =
            r#"((use_list (identifier) @name (identifier) @name) (#not-match? @name "^[A-Z]"))"#;
        let results = filtered(negated, b"use m::{a, b};\nuse m::{c, D};");
        assert!(results[0].0);
        assert!(!results[1].0);
    }

    #[test]
    fn property_and_unknown_predicates_always_pass() {
        let results = filtered(
            r#"((identifier) @id (#set! role "name") (#frobnicate? @id "whatever"))"#,
            b"fn a() {}",
        );
        assert_eq!(results, [(true, vec!["a".to_string()])]);
    }

    #[test]
    fn rejected_match_yields_no_captures() {
        let results = filtered(r#"((identifier) @id (#eq? @id "zzz"))"#, b"fn a() {}");
        let (accepted, captures) = &results[0];
        assert!(!accepted);
        assert!(captures.is_empty());
    }
}
