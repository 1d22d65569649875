use std::fmt;
use thiserror::Error;

/// Coarse category of a query compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    Syntax,
    UnknownNodeType,
    UnknownField,
    UnknownCapture,
    Structure,
    GrammarMismatch,
    /// A predicate form that does not start with an operator name.
    MalformedPredicate,
    WrongArity,
    WrongArgumentKind,
    InvalidRegex,
}

impl QueryErrorKind {
    fn describe(self) -> &'static str {
        match self {
            QueryErrorKind::Syntax => "syntax",
            QueryErrorKind::UnknownNodeType => "node type",
            QueryErrorKind::UnknownField => "field",
            QueryErrorKind::UnknownCapture => "capture",
            QueryErrorKind::Structure => "structure",
            QueryErrorKind::GrammarMismatch => "language",
            QueryErrorKind::MalformedPredicate
            | QueryErrorKind::WrongArity
            | QueryErrorKind::WrongArgumentKind
            | QueryErrorKind::InvalidRegex => "predicate",
        }
    }

    /// Errors about a single identifier echo that identifier; the rest
    /// echo the offending line.
    fn is_identifier_error(self) -> bool {
        matches!(
            self,
            QueryErrorKind::UnknownNodeType
                | QueryErrorKind::UnknownField
                | QueryErrorKind::UnknownCapture
        )
    }

    pub fn is_predicate_error(self) -> bool {
        matches!(
            self,
            QueryErrorKind::MalformedPredicate
                | QueryErrorKind::WrongArity
                | QueryErrorKind::WrongArgumentKind
                | QueryErrorKind::InvalidRegex
        )
    }
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl From<tree_sitter::QueryErrorKind> for QueryErrorKind {
    fn from(kind: tree_sitter::QueryErrorKind) -> Self {
        match kind {
            tree_sitter::QueryErrorKind::Syntax => QueryErrorKind::Syntax,
            tree_sitter::QueryErrorKind::NodeType => QueryErrorKind::UnknownNodeType,
            tree_sitter::QueryErrorKind::Field => QueryErrorKind::UnknownField,
            tree_sitter::QueryErrorKind::Capture => QueryErrorKind::UnknownCapture,
            tree_sitter::QueryErrorKind::Predicate => QueryErrorKind::MalformedPredicate,
            tree_sitter::QueryErrorKind::Structure => QueryErrorKind::Structure,
            tree_sitter::QueryErrorKind::Language => QueryErrorKind::GrammarMismatch,
        }
    }
}

/// Query compilation failure. Nothing is partially compiled.
///
/// `row` and `column` are zero-based; the message renders them one-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct QueryError {
    pub offset: usize,
    pub row: usize,
    pub column: usize,
    pub kind: QueryErrorKind,
    /// Operator name for predicate errors.
    pub operator: Option<String>,
    pub message: String,
}

impl QueryError {
    /// Build an error at `offset` with the standard positional message.
    pub(crate) fn at(source: &str, offset: usize, kind: QueryErrorKind) -> Self {
        let (row, column) = locate(source, offset);
        let message = if kind.is_identifier_error() {
            match identifier_at(source, offset) {
                Some(ident) => format!(
                    "invalid {kind} '{ident}' at line {} column {}",
                    row + 1,
                    column + 1
                ),
                None => format!("invalid {kind} at line {} column {}", row + 1, column + 1),
            }
        } else {
            let line = source[offset.min(source.len()) - column..]
                .lines()
                .next()
                .unwrap_or_default();
            format!(
                "invalid {kind} at line {} column {}\n{line}\n{}^",
                row + 1,
                column + 1,
                " ".repeat(column)
            )
        };

        Self {
            offset,
            row,
            column,
            kind,
            operator: None,
            message,
        }
    }

    /// A predicate validation error with a caller-supplied message.
    pub(crate) fn predicate(
        source: &str,
        offset: usize,
        kind: QueryErrorKind,
        operator: Option<&str>,
        message: String,
    ) -> Self {
        let (row, column) = locate(source, offset);
        Self {
            offset,
            row,
            column,
            kind,
            operator: operator.map(str::to_string),
            message,
        }
    }

    pub(crate) fn from_engine(source: &str, error: tree_sitter::QueryError) -> Self {
        Self::at(source, error.offset, error.kind.into())
    }
}

/// Zero-based row and byte column of `offset`.
fn locate(source: &str, offset: usize) -> (usize, usize) {
    let prefix = &source.as_bytes()[..offset.min(source.len())];
    let row = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    (row, prefix.len() - line_start)
}

fn identifier_at(source: &str, offset: usize) -> Option<&str> {
    let rest = source.get(offset..)?;
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map_or(rest.len(), |(idx, _)| idx);
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_errors_echo_the_identifier() {
        let source = "(function_item)\n(bogus_node)";
        let err = QueryError::at(source, 17, QueryErrorKind::UnknownNodeType);
        assert_eq!(err.row, 1);
        assert_eq!(err.column, 1);
        assert_eq!(err.message, "invalid node type 'bogus_node' at line 2 column 2");
    }

    #[test]
    fn positional_errors_echo_line_with_caret() {
        let source = "(a)\n(b c))";
        let err = QueryError::at(source, 9, QueryErrorKind::Syntax);
        assert_eq!(err.message, "invalid syntax at line 2 column 6\n(b c))\n     ^");
    }

    #[test]
    fn identifier_error_without_identifier() {
        let err = QueryError::at("(@)", 1, QueryErrorKind::UnknownCapture);
        assert_eq!(err.message, "invalid capture at line 1 column 2");
    }

    #[test]
    fn engine_kinds_map_to_categories() {
        assert_eq!(
            QueryErrorKind::from(tree_sitter::QueryErrorKind::Language),
            QueryErrorKind::GrammarMismatch
        );
        assert_eq!(
            QueryErrorKind::from(tree_sitter::QueryErrorKind::Field),
            QueryErrorKind::UnknownField
        );
    }
}
