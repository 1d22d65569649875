use crate::query::compile::PatternQuery;
use std::ops::Range;
use tree_sitter::{Node, Point, QueryCaptures, QueryCursor, QueryMatches, StreamingIterator};

/// Text provider handed to the engine. Predicates are stripped before the
/// engine sees the query, so it never asks for node text.
const NO_TEXT: &[u8] = &[];

/// One captured node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture<'tree> {
    /// Index into [`PatternQuery::capture_names`].
    pub index: u32,
    pub node: Node<'tree>,
}

impl<'tree> Capture<'tree> {
    /// The node's bytes within `source`; empty if the node lies outside it.
    pub fn text<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        source.get(self.node.byte_range()).unwrap_or_default()
    }
}

/// A structural match, before predicate filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch<'tree> {
    pub id: u32,
    pub pattern_index: usize,
    pub captures: Vec<Capture<'tree>>,
}

impl<'tree> QueryMatch<'tree> {
    fn from_engine(m: &tree_sitter::QueryMatch<'_, 'tree>) -> Self {
        Self {
            id: m.id(),
            pattern_index: m.pattern_index,
            captures: m
                .captures
                .iter()
                .map(|c| Capture {
                    index: c.index,
                    node: c.node,
                })
                .collect(),
        }
    }

    /// Nodes bound to capture `index`, in match order.
    pub fn nodes_for_capture(&self, index: u32) -> impl Iterator<Item = Node<'tree>> + '_ {
        self.captures
            .iter()
            .filter(move |c| c.index == index)
            .map(|c| c.node)
    }
}

/// Executes [`PatternQuery`]s over syntax trees.
///
/// Range restrictions apply to every execution started afterwards.
pub struct MatchCursor {
    cursor: QueryCursor,
}

impl Default for MatchCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchCursor {
    pub fn new() -> Self {
        Self {
            cursor: QueryCursor::new(),
        }
    }

    /// Skip matches lying entirely outside `range`.
    pub fn set_point_range(&mut self, range: Range<Point>) -> &mut Self {
        self.cursor.set_point_range(range);
        self
    }

    pub fn set_byte_range(&mut self, range: Range<usize>) -> &mut Self {
        self.cursor.set_byte_range(range);
        self
    }

    /// Cap the number of in-progress matches the engine tracks.
    pub fn set_match_limit(&mut self, limit: u32) -> &mut Self {
        self.cursor.set_match_limit(limit);
        self
    }

    pub fn did_exceed_match_limit(&self) -> bool {
        self.cursor.did_exceed_match_limit()
    }

    /// Start executing `query` under `node`.
    ///
    /// The iterator is lazy and finite; iterating again means calling
    /// `matches` again.
    pub fn matches<'q, 'tree>(
        &'q mut self,
        query: &'q PatternQuery,
        node: Node<'tree>,
    ) -> Matches<'q, 'tree> {
        Matches {
            inner: self.cursor.matches(query.engine_query(), node, NO_TEXT),
        }
    }

    /// Captures across all matches in document order, each with its match
    /// and its position in that match's captures.
    pub fn captures<'q, 'tree>(
        &'q mut self,
        query: &'q PatternQuery,
        node: Node<'tree>,
    ) -> Captures<'q, 'tree> {
        Captures {
            inner: self.cursor.captures(query.engine_query(), node, NO_TEXT),
        }
    }
}

pub struct Matches<'q, 'tree> {
    inner: QueryMatches<'q, 'tree, &'static [u8], &'static [u8]>,
}

impl<'tree> Iterator for Matches<'_, 'tree> {
    type Item = QueryMatch<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(QueryMatch::from_engine)
    }
}

pub struct Captures<'q, 'tree> {
    inner: QueryCaptures<'q, 'tree, &'static [u8], &'static [u8]>,
}

impl<'tree> Iterator for Captures<'_, 'tree> {
    type Item = (QueryMatch<'tree>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(m, position)| (QueryMatch::from_engine(m), *position))
    }
}
