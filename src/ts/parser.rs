use crate::grammar::Grammar;
use crate::ts::cancel::CancellationToken;
use crate::ts::errors::ParseError;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use tree_sitter::{LogType, ParseOptions, ParseState, Parser, Point, Range, Tree};

/// What stopped a parse before it produced a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Cancelled,
    Budget,
}

/// Tree-sitter parser wrapper bound to one grammar.
///
/// A parser instance is single-threaded state: give each document its own
/// instance, or serialize access externally.
pub struct SyntaxParser {
    parser: Parser,
    grammar: Option<Grammar>,
    operation_limit: Option<Duration>,
}

impl SyntaxParser {
    /// Create a parser for `grammar`.
    pub fn new(grammar: &Grammar) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar.language())
            .map_err(|e| ParseError::incompatible(grammar.name(), e.to_string()))?;

        Ok(Self {
            parser,
            grammar: Some(grammar.clone()),
            operation_limit: None,
        })
    }

    /// A parser with no grammar configured. Every parse fails with
    /// [`ParseError::NoGrammar`].
    pub fn unconfigured() -> Self {
        Self {
            parser: Parser::new(),
            grammar: None,
            operation_limit: None,
        }
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.as_ref()
    }

    pub fn operation_limit(&self) -> Option<Duration> {
        self.operation_limit
    }

    /// Bound the wall-clock time a single parse may take.
    pub fn set_operation_limit(&mut self, limit: Option<Duration>) {
        self.operation_limit = limit;
    }

    pub fn with_operation_limit(mut self, limit: Option<Duration>) -> Self {
        self.operation_limit = limit;
        self
    }

    /// Parse the whole of `source`, reusing unchanged subtrees of
    /// `previous` when it has been edited to match.
    pub fn parse(
        &mut self,
        source: &[u8],
        previous: Option<&Tree>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Tree, ParseError> {
        self.parse_with(&mut slice_reader(source), previous, cancel)
    }

    /// Parse text supplied in chunks by `read`, for buffers that are not
    /// one contiguous slice.
    ///
    /// `read` receives a byte offset and its point and returns the text
    /// starting there; an empty chunk ends the input.
    pub fn parse_with<T, F>(
        &mut self,
        read: &mut F,
        previous: Option<&Tree>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Tree, ParseError>
    where
        T: AsRef<[u8]>,
        F: FnMut(usize, Point) -> T,
    {
        // An empty range set resets the parser to the whole document.
        self.parser
            .set_included_ranges(&[])
            .map_err(|e| ParseError::InvalidRanges { index: e.0 })?;
        self.run(read, previous, cancel)
    }

    /// Parse only the bytes inside `ranges`, which must be ordered and
    /// non-overlapping.
    pub fn parse_ranges(
        &mut self,
        source: &[u8],
        previous: Option<&Tree>,
        ranges: &[Range],
        cancel: Option<&CancellationToken>,
    ) -> Result<Tree, ParseError> {
        self.parser
            .set_included_ranges(ranges)
            .map_err(|e| ParseError::InvalidRanges { index: e.0 })?;
        self.run(&mut slice_reader(source), previous, cancel)
    }

    /// Parse and keep the source alongside the tree.
    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a [u8],
        cancel: Option<&CancellationToken>,
    ) -> Result<ParsedSource<'a>, ParseError> {
        let tree = self.parse(source, None, cancel)?;
        Ok(ParsedSource { source, tree })
    }

    /// Forward the engine's internal parse and lex log to `tracing` at
    /// trace level, under the `canopy::engine` target.
    pub fn set_engine_logging(&mut self, enabled: bool) {
        if enabled {
            self.parser.set_logger(Some(Box::new(|kind: LogType, message: &str| {
                let kind = match kind {
                    LogType::Parse => "parse",
                    LogType::Lex => "lex",
                };
                trace!(target: "canopy::engine", kind, "{message}");
            })));
        } else {
            self.parser.set_logger(None);
        }
    }

    pub fn engine_logging(&self) -> bool {
        self.parser.logger().is_some()
    }

    fn run<T, F>(
        &mut self,
        read: &mut F,
        previous: Option<&Tree>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Tree, ParseError>
    where
        T: AsRef<[u8]>,
        F: FnMut(usize, Point) -> T,
    {
        let grammar = match &self.grammar {
            Some(grammar) if self.parser.language().is_some() => grammar.name().to_string(),
            _ => return Err(ParseError::NoGrammar),
        };

        let deadline = self.operation_limit.map(|limit| Instant::now() + limit);
        let mut halt = None;
        let mut progress = |_: &ParseState| {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                trace!("cancellation observed");
                halt = Some(Halt::Cancelled);
                return true;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                halt = Some(Halt::Budget);
                return true;
            }
            false
        };

        let options = ParseOptions::new().progress_callback(&mut progress);
        let tree = self.parser.parse_with_options(read, previous, Some(options));

        match tree {
            Some(tree) => {
                debug!(
                    grammar = %grammar,
                    bytes = tree.root_node().end_byte(),
                    incremental = previous.is_some(),
                    "parsed"
                );
                Ok(tree)
            }
            None => {
                // A halted parse would otherwise resume on the next call.
                self.parser.reset();
                let error = match halt {
                    Some(Halt::Cancelled) => ParseError::Cancelled,
                    _ if cancel.is_some_and(CancellationToken::is_cancelled) => {
                        ParseError::Cancelled
                    }
                    _ => ParseError::OperationLimitExceeded {
                        limit: self.operation_limit.unwrap_or_default(),
                    },
                };
                debug!(grammar = %grammar, %error, "parse halted");
                Err(error)
            }
        }
    }
}

fn slice_reader<'a>(source: &'a [u8]) -> impl FnMut(usize, Point) -> &'a [u8] + 'a {
    move |offset, _| source.get(offset..).unwrap_or_default()
}

/// A parsed source buffer with its tree-sitter tree.
#[derive(Debug)]
pub struct ParsedSource<'a> {
    pub source: &'a [u8],
    pub tree: Tree,
}

impl<'a> ParsedSource<'a> {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Extract the bytes covered by a node.
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &'a [u8] {
        &self.source[node.byte_range()]
    }

    /// S-expression of the whole tree.
    pub fn to_sexp(&self) -> String {
        self.tree.root_node().to_sexp()
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: Point,
    pub end_point: Point,
    pub missing: bool,
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
            missing: node.is_missing(),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}
