//! Canopy: incremental syntax trees, predicate-aware structural queries and
//! multi-grammar documents on top of tree-sitter.
//!
//! # Architecture
//!
//! - [`ts`] wraps the parser so every parse has an explicit outcome: a
//!   tree, or a [`ParseError`] telling cancellation, budget exhaustion and
//!   a missing grammar apart.
//! - [`query`] compiles S-expression pattern queries, runs them lazily and
//!   filters matches through `#eq?` / `#match?` predicates.
//! - [`compose`] parses regions of a document with a second grammar and
//!   keeps all trees in sync across edits.
//! - [`grammar`] holds the explicit grammar registry.
//!
//! # Example
//!
//! ```no_run
//! use canopy::grammar::builtin;
//! use canopy::query::{MatchCursor, PatternQuery};
//! use canopy::ts::SyntaxParser;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grammar = builtin::rust();
//! let source = b"fn main() { let x = x; }";
//! let tree = SyntaxParser::new(&grammar)?.parse(source, None, None)?;
//!
//! let query = PatternQuery::new(
//!     &grammar,
//!     "(let_declaration pattern: (_) @a value: (_) @b (#eq? @a @b))",
//! )?;
//! let mut cursor = MatchCursor::new();
//! for m in cursor.matches(&query, tree.root_node()) {
//!     let filtered = query.filter(&m, source);
//!     if filtered.is_accepted() {
//!         println!("self-assignment at byte {}", filtered.captures[0].node.start_byte());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod config;
pub mod grammar;
pub mod markdown;
pub mod pool;
pub mod query;
pub mod ts;

// Re-exports
pub use compose::{ComposeError, Composer, CompositeNode, CompositeTree, SecondaryTree};
pub use config::{load_from_path, load_from_str, CanopyConfig, ConfigError};
pub use grammar::{Grammar, GrammarRegistry, RegistryError};
pub use markdown::MarkdownParser;
pub use query::{
    FilteredMatch, MatchCursor, PatternQuery, QueryError, QueryErrorKind, QueryMatch,
};
pub use ts::{CancellationToken, EditError, ParseError, ParsedSource, SyntaxParser, TextEdit};
