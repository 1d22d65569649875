//! Pattern queries: compilation, execution and predicate filtering.
//!
//! Queries use tree-sitter's S-expression syntax. Structural matching is
//! done by the engine; text predicates (`#eq?`, `#match?` and their
//! negations) are validated when the query is compiled and evaluated by
//! [`PatternQuery::filter`].

pub mod compile;
pub mod cursor;
pub mod errors;
mod extract;
pub mod filter;
pub mod predicate;
pub mod regex_cache;

pub use compile::PatternQuery;
pub use cursor::{Capture, Captures, MatchCursor, Matches, QueryMatch};
pub use errors::{QueryError, QueryErrorKind};
pub use filter::FilteredMatch;
pub use predicate::{Operand, Predicate, PredicateArg, PropertyKind};
pub use tree_sitter::CaptureQuantifier;
