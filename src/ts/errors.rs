use std::time::Duration;
use thiserror::Error;

/// Why a parse call produced no tree.
///
/// The engine reports every failure as an empty result; [`SyntaxParser`]
/// inspects its own state to tell these apart.
///
/// [`SyntaxParser`]: crate::ts::SyntaxParser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("parse was cancelled")]
    Cancelled,

    #[error("parse exceeded its operation limit of {}ms", limit.as_millis())]
    OperationLimitExceeded { limit: Duration },

    #[error("cannot parse without a grammar")]
    NoGrammar,

    #[error("included range {index} is out of order or overlaps the previous range")]
    InvalidRanges { index: usize },

    #[error("grammar '{grammar}' cannot be loaded: {message}")]
    IncompatibleGrammar { grammar: String, message: String },
}

impl ParseError {
    /// Cancellation and budget exhaustion leave the parser usable for a
    /// fresh attempt; the other variants are setup defects.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::Cancelled | ParseError::OperationLimitExceeded { .. }
        )
    }

    pub(crate) fn incompatible(grammar: &str, message: impl Into<String>) -> Self {
        ParseError::IncompatibleGrammar {
            grammar: grammar.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid byte range: [{byte_start}, {byte_end}) in source of length {source_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        source_len: usize,
    },
}
