//! Markdown as a block tree plus one inline tree per `inline` node.

use crate::compose::{ComposeError, Composer, CompositeTree};
use crate::grammar::builtin;
use crate::ts::CancellationToken;
use std::time::Duration;

/// Anchor selecting the block nodes whose text the inline grammar parses.
pub const INLINE_ANCHOR: &str = "(inline) @inline";

/// A [`Composer`] preconfigured for Markdown.
pub struct MarkdownParser {
    composer: Composer,
}

impl MarkdownParser {
    pub fn new() -> Result<Self, ComposeError> {
        Ok(Self {
            composer: Composer::new(
                &builtin::markdown(),
                &builtin::markdown_inline(),
                INLINE_ANCHOR,
            )?,
        })
    }

    pub fn set_operation_limit(&mut self, limit: Option<Duration>) {
        self.composer.set_operation_limit(limit);
    }

    /// Parse `source`, reusing `previous` (already edited) when given.
    pub fn parse(
        &mut self,
        source: &[u8],
        previous: Option<&CompositeTree>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompositeTree, ComposeError> {
        match previous {
            Some(previous) => self.composer.rebuild(previous, source, cancel),
            None => self.composer.build(source, cancel),
        }
    }
}
