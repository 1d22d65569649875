//! Thread-local parser pooling.
//!
//! Keeps one [`SyntaxParser`] per grammar name per thread. A parser is
//! created on first use and reused afterwards.

use crate::grammar::Grammar;
use crate::ts::{CancellationToken, ParseError, ParsedSource, SyntaxParser};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

thread_local! {
    static PARSERS: RefCell<HashMap<String, SyntaxParser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with this thread's parser for `grammar`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use canopy::grammar::builtin;
/// use canopy::pool::with_parser;
///
/// let tree = with_parser(&builtin::rust(), |parser| {
///     parser.parse(b"fn main() {}", None, None)
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(grammar: &Grammar, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut SyntaxParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(grammar.name().to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(SyntaxParser::new(grammar)?),
        };
        Ok(f(parser))
    })
}

/// Parse `source` with a pooled parser in one call.
pub fn parse_source<'a>(
    grammar: &Grammar,
    source: &'a [u8],
    operation_limit: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<ParsedSource<'a>, ParseError> {
    with_parser(grammar, |parser| {
        parser.set_operation_limit(operation_limit);
        parser.parse_with_source(source, cancel)
    })?
}

/// Drop this thread's pooled parsers.
pub fn clear() {
    PARSERS.with(|cell| cell.borrow_mut().clear());
}
