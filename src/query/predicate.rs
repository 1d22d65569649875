//! Validated predicates and their evaluation against a match.

use crate::query::cursor::Capture;
use crate::query::errors::{QueryError, QueryErrorKind};
use crate::query::extract::{PredicateStep, RawPredicate};
use crate::query::regex_cache;
use regex::bytes::Regex;

/// Right-hand side of an `eq?` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Capture(u32),
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `#set!`
    Set,
    /// `#is?`
    Is,
    /// `#is-not?`
    IsNot,
}

/// An argument kept verbatim for operators this crate does not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateArg {
    Capture(u32),
    String(String),
}

#[derive(Debug, Clone)]
pub enum Predicate {
    /// `#eq?` / `#not-eq?`
    Eq {
        left: u32,
        right: Operand,
        negated: bool,
    },
    /// `#match?` / `#not-match?`
    Match {
        capture: u32,
        regex: Regex,
        negated: bool,
    },
    Property {
        kind: PropertyKind,
        key: String,
        value: Option<String>,
    },
    Unknown {
        operator: String,
        args: Vec<PredicateArg>,
    },
}

impl Predicate {
    /// Validate a raw predicate. `capture_index` resolves capture names
    /// against the compiled query.
    pub(crate) fn from_raw<F>(
        raw: &RawPredicate,
        source: &str,
        capture_index: F,
    ) -> Result<Self, QueryError>
    where
        F: Fn(&str) -> Option<u32>,
    {
        let Some(operator) = raw.operator.as_deref() else {
            return Err(QueryError::predicate(
                source,
                raw.offset,
                QueryErrorKind::MalformedPredicate,
                None,
                "predicate must begin with a literal value".to_string(),
            ));
        };
        let check = Validator {
            raw,
            source,
            operator,
        };

        // Every capture reference must exist, whatever the operator.
        let mut resolved = Vec::with_capacity(raw.args.len());
        for arg in &raw.args {
            resolved.push(match arg {
                PredicateStep::Capture { name, offset } => match capture_index(name) {
                    Some(index) => PredicateArg::Capture(index),
                    None => {
                        return Err(QueryError::at(
                            source,
                            *offset,
                            QueryErrorKind::UnknownCapture,
                        ))
                    }
                },
                PredicateStep::String { value, .. } => PredicateArg::String(value.clone()),
            });
        }

        match operator {
            "eq?" | "not-eq?" => {
                check.arity(2, "2")?;
                let left = check.capture_at(&resolved, 0, "first")?;
                let right = match &resolved[1] {
                    PredicateArg::Capture(index) => Operand::Capture(*index),
                    PredicateArg::String(value) => Operand::Literal(value.clone()),
                };
                Ok(Predicate::Eq {
                    left,
                    right,
                    negated: operator == "not-eq?",
                })
            }
            "match?" | "not-match?" => {
                check.arity(2, "2")?;
                let capture = check.capture_at(&resolved, 0, "first")?;
                let pattern = check.string_at(&resolved, 1, "second")?;
                let regex = regex_cache::get_or_compile(pattern).map_err(|err| {
                    QueryError::predicate(
                        source,
                        raw.args[1].offset(),
                        QueryErrorKind::InvalidRegex,
                        Some(operator),
                        format!("invalid regex in `#{operator}` predicate: {err}"),
                    )
                })?;
                Ok(Predicate::Match {
                    capture,
                    regex,
                    negated: operator == "not-match?",
                })
            }
            "set!" | "is?" | "is-not?" => {
                if raw.args.is_empty() || raw.args.len() > 2 {
                    return Err(check.wrong_arity("1 or 2"));
                }
                let key = check.string_at(&resolved, 0, "first")?.to_string();
                let value = match resolved.get(1) {
                    Some(_) => Some(check.string_at(&resolved, 1, "second")?.to_string()),
                    None => None,
                };
                let kind = match operator {
                    "set!" => PropertyKind::Set,
                    "is?" => PropertyKind::Is,
                    _ => PropertyKind::IsNot,
                };
                Ok(Predicate::Property { kind, key, value })
            }
            _ => Ok(Predicate::Unknown {
                operator: operator.to_string(),
                args: resolved,
            }),
        }
    }

    /// Whether the predicate holds for `captures` over `source`.
    ///
    /// Property and unknown predicates always hold.
    pub fn evaluate(&self, captures: &[Capture<'_>], source: &[u8]) -> bool {
        match self {
            Predicate::Eq {
                left,
                right: Operand::Capture(right),
                negated,
            } => {
                let first = |index: u32| captures.iter().find(|c| c.index == index);
                match (first(*left), first(*right)) {
                    (Some(a), Some(b)) => (a.text(source) == b.text(source)) != *negated,
                    // Nothing to compare: `eq?` fails, `not-eq?` holds.
                    _ => *negated,
                }
            }
            Predicate::Eq {
                left,
                right: Operand::Literal(literal),
                negated,
            } => captures
                .iter()
                .filter(|c| c.index == *left)
                .all(|c| (c.text(source) == literal.as_bytes()) != *negated),
            Predicate::Match {
                capture,
                regex,
                negated,
            } => captures
                .iter()
                .filter(|c| c.index == *capture)
                .all(|c| regex.is_match(c.text(source)) != *negated),
            Predicate::Property { .. } | Predicate::Unknown { .. } => true,
        }
    }
}

struct Validator<'a> {
    raw: &'a RawPredicate,
    source: &'a str,
    operator: &'a str,
}

impl Validator<'_> {
    fn arity(&self, expected: usize, shown: &str) -> Result<(), QueryError> {
        if self.raw.args.len() == expected {
            Ok(())
        } else {
            Err(self.wrong_arity(shown))
        }
    }

    fn wrong_arity(&self, shown: &str) -> QueryError {
        QueryError::predicate(
            self.source,
            self.raw.offset,
            QueryErrorKind::WrongArity,
            Some(self.operator),
            format!(
                "wrong number of arguments to `#{}` predicate. Expected {shown}, got {}",
                self.operator,
                self.raw.args.len()
            ),
        )
    }

    fn capture_at(
        &self,
        resolved: &[PredicateArg],
        position: usize,
        ordinal: &str,
    ) -> Result<u32, QueryError> {
        match &resolved[position] {
            PredicateArg::Capture(index) => Ok(*index),
            PredicateArg::String(_) => Err(self.wrong_kind(position, ordinal, "a capture")),
        }
    }

    fn string_at<'r>(
        &self,
        resolved: &'r [PredicateArg],
        position: usize,
        ordinal: &str,
    ) -> Result<&'r str, QueryError> {
        match &resolved[position] {
            PredicateArg::String(value) => Ok(value),
            PredicateArg::Capture(_) => Err(self.wrong_kind(position, ordinal, "a string")),
        }
    }

    fn wrong_kind(&self, position: usize, ordinal: &str, expected: &str) -> QueryError {
        let step = &self.raw.args[position];
        let got = match step {
            PredicateStep::Capture { name, .. } => format!("@{name}"),
            PredicateStep::String { value, .. } => value.clone(),
        };
        QueryError::predicate(
            self.source,
            step.offset(),
            QueryErrorKind::WrongArgumentKind,
            Some(self.operator),
            format!(
                "{ordinal} argument of `#{}` predicate must be {expected}. Got {got}",
                self.operator
            ),
        )
    }
}
