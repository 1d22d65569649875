//! Tree-sitter engine contract.
//!
//! This module wraps the raw tree-sitter parser so that every parse
//! returns an explicit outcome: a tree, or a [`ParseError`] saying whether
//! the parse was cancelled, ran out of budget, or had no grammar. Edits
//! are described by [`TextEdit`] so that several trees sharing one
//! document can be kept in sync.

pub mod cancel;
pub mod edit;
pub mod errors;
pub mod parser;

pub use cancel::CancellationToken;
pub use edit::{point_at, TextEdit};
pub use errors::{EditError, ParseError};
pub use parser::{ErrorNode, ParsedSource, SyntaxParser};
