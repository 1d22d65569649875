//! Cooperative cancellation for long-running parses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a caller flips to stop an in-flight parse.
///
/// Clones observe the same flag, so one clone can be handed to another
/// thread (or a timer) while the parsing thread passes its own clone into
/// [`SyntaxParser::parse`]. The parser polls the flag at the engine's
/// progress checkpoints and winds down with [`ParseError::Cancelled`].
///
/// A token stays cancelled once flipped; start a new attempt with a new
/// token.
///
/// [`SyntaxParser::parse`]: crate::ts::SyntaxParser::parse
/// [`ParseError::Cancelled`]: crate::ts::ParseError::Cancelled
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
