use crate::grammar::Grammar;
use crate::query::errors::{QueryError, QueryErrorKind};
use crate::query::extract::extract;
use crate::query::predicate::{Predicate, PropertyKind};
use tracing::debug;
use tree_sitter::{CaptureQuantifier, Query};

/// A compiled pattern query with validated predicates.
///
/// Predicates are evaluated by [`PatternQuery::filter`], not by the
/// engine; matches produced by a [`MatchCursor`](crate::query::MatchCursor)
/// are structural only until filtered.
#[derive(Debug)]
pub struct PatternQuery {
    grammar: Grammar,
    query: Query,
    capture_names: Vec<String>,
    predicates: Vec<Vec<Predicate>>,
}

impl PatternQuery {
    /// Compile `source` against `grammar`.
    ///
    /// # Query Syntax
    ///
    /// ```text
    /// ((identifier) @a
    ///  (identifier) @b
    ///  (#eq? @a @b))
    /// ```
    ///
    /// Nothing is partially compiled: any structural or predicate error
    /// fails the whole query.
    pub fn new(grammar: &Grammar, source: &str) -> Result<Self, QueryError> {
        let extracted = extract(source)?;
        let query = Query::new(grammar.language(), &extracted.structural)
            .map_err(|e| QueryError::from_engine(source, e))?;

        let capture_names: Vec<String> =
            query.capture_names().iter().map(|s| s.to_string()).collect();
        let starts: Vec<usize> = (0..query.pattern_count())
            .map(|i| query.start_byte_for_pattern(i))
            .collect();

        let mut predicates = vec![Vec::new(); query.pattern_count()];
        for raw in &extracted.predicates {
            let predicate = Predicate::from_raw(raw, source, |name| {
                capture_names
                    .iter()
                    .position(|n| n == name)
                    .map(|i| i as u32)
            })?;

            let pattern = starts.partition_point(|&start| start <= raw.offset);
            match pattern.checked_sub(1).and_then(|i| predicates.get_mut(i)) {
                Some(slot) => slot.push(predicate),
                None => return Err(QueryError::at(source, raw.offset, QueryErrorKind::Structure)),
            }
        }

        debug!(
            grammar = grammar.name(),
            patterns = query.pattern_count(),
            captures = capture_names.len(),
            predicates = extracted.predicates.len(),
            "compiled query"
        );

        Ok(Self {
            grammar: grammar.clone(),
            query,
            capture_names,
            predicates,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn pattern_count(&self) -> usize {
        self.query.pattern_count()
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_name(&self, index: u32) -> Option<&str> {
        self.capture_names.get(index as usize).map(String::as_str)
    }

    pub fn capture_index(&self, name: &str) -> Option<u32> {
        self.capture_names
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32)
    }

    /// How often capture `index` may occur in one match of
    /// `pattern_index`. `Zero` when the pattern does not use the capture.
    pub fn capture_quantifier(
        &self,
        pattern_index: usize,
        index: u32,
    ) -> Option<CaptureQuantifier> {
        if pattern_index >= self.query.pattern_count() {
            return None;
        }
        self.query
            .capture_quantifiers(pattern_index)
            .get(index as usize)
            .copied()
    }

    /// Predicates attached to `pattern_index`, in source order.
    pub fn predicates(&self, pattern_index: usize) -> &[Predicate] {
        self.predicates
            .get(pattern_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `#set!` key/value pairs of a pattern.
    pub fn property_settings(&self, pattern_index: usize) -> Vec<(&str, Option<&str>)> {
        self.predicates(pattern_index)
            .iter()
            .filter_map(|p| match p {
                Predicate::Property {
                    kind: PropertyKind::Set,
                    key,
                    value,
                } => Some((key.as_str(), value.as_deref())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn engine_query(&self) -> &Query {
        &self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::builtin;

    #[test]
    fn predicates_are_assigned_to_their_pattern() {
        let source = r#"
(identifier) @plain

((string_literal) @s
  (#match? @s "^\"x")
  (#set! kind "text"))
"#;
        let query = PatternQuery::new(&builtin::rust(), source).unwrap();
        assert_eq!(query.pattern_count(), 2);
        assert!(query.predicates(0).is_empty());
        assert_eq!(query.predicates(1).len(), 2);
        assert_eq!(query.property_settings(1), [("kind", Some("text"))]);
        assert!(query.predicates(7).is_empty());
    }

    #[test]
    fn capture_lookup() {
        let query =
            PatternQuery::new(&builtin::go(), "(function_declaration name: (identifier) @name) @fn")
                .unwrap();
        assert_eq!(query.capture_names(), ["name", "fn"]);
        assert_eq!(query.capture_index("fn"), Some(1));
        assert_eq!(query.capture_name(0), Some("name"));
        assert_eq!(query.capture_index("missing"), None);
    }

    #[test]
    fn capture_quantifiers_per_pattern() {
        let query = PatternQuery::new(
            &builtin::rust(),
            "(function_item name: (identifier) @name body: (block (expression_statement)* @stmt))
             (arguments (identifier)+ @other)",
        )
        .unwrap();
        let stmt = query.capture_index("stmt").unwrap();
        let other = query.capture_index("other").unwrap();

        assert_eq!(query.capture_quantifier(0, 0), Some(CaptureQuantifier::One));
        assert_eq!(query.capture_quantifier(0, stmt), Some(CaptureQuantifier::ZeroOrMore));
        assert_eq!(query.capture_quantifier(0, other), Some(CaptureQuantifier::Zero));
        assert_eq!(query.capture_quantifier(1, 0), Some(CaptureQuantifier::Zero));
        assert_eq!(query.capture_quantifier(1, other), Some(CaptureQuantifier::OneOrMore));
        assert_eq!(query.capture_quantifier(2, 0), None);
        assert_eq!(query.capture_quantifier(0, 9), None);
    }

    #[test]
    fn unknown_node_type_is_reported_with_identifier() {
        let err = PatternQuery::new(&builtin::rust(), "(function_item)\n(bogus_node)").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::UnknownNodeType);
        assert_eq!(err.message, "invalid node type 'bogus_node' at line 2 column 2");
    }

    #[test]
    fn engine_errors_keep_original_offsets() {
        // The predicate before the bad field is blanked, not removed.
        let source = "((identifier) @a (#eq? @a \"x\")) (function_item nope: (identifier))";
        let err = PatternQuery::new(&builtin::rust(), source).unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::UnknownField);
        assert_eq!(err.offset, source.find("nope").unwrap());
    }

    #[test]
    fn predicate_capture_must_exist() {
        let err =
            PatternQuery::new(&builtin::rust(), "((identifier) @a (#eq? @a @b))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::UnknownCapture);
    }

    #[test]
    fn syntax_error_echoes_line() {
        let err = PatternQuery::new(&builtin::rust(), "(identifier))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Syntax);
        assert!(err.message.starts_with("invalid syntax at line 1"));
        assert!(err.message.contains("\n(identifier))\n"));
    }
}
