use crate::compose::ranges::node_covering_ranges;
use crate::grammar::Grammar;
use crate::query::{MatchCursor, PatternQuery, QueryError};
use crate::ts::{CancellationToken, ParseError, SyntaxParser, TextEdit};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tree_sitter::{Node, Range, Tree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("cannot configure parser: {0}")]
    Setup(#[source] ParseError),

    #[error("primary parse failed: {0}")]
    Primary(#[source] ParseError),

    #[error("secondary parse #{ordinal} failed: {source}")]
    Secondary {
        ordinal: usize,
        #[source]
        source: ParseError,
    },

    #[error(
        "anchor query must have exactly one pattern and one capture \
         (found {patterns} pattern(s), {captures} capture(s))"
    )]
    InvalidAnchorQuery { patterns: usize, captures: usize },

    #[error("invalid anchor query: {0}")]
    Query(#[from] QueryError),
}

impl ComposeError {
    /// The underlying parse outcome, if a parse failed.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            ComposeError::Primary(err) | ComposeError::Secondary { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Parses a document with a primary grammar, then re-parses the regions
/// selected by an anchor query with a secondary grammar.
///
/// One composer serves one document timeline; it is not meant to be
/// shared across threads.
pub struct Composer {
    primary: SyntaxParser,
    secondary: SyntaxParser,
    anchor: PatternQuery,
    cursor: MatchCursor,
    #[cfg(test)]
    before_regions: Option<Box<dyn Fn()>>,
}

impl Composer {
    /// `anchor_query` is compiled against `primary` and must have exactly
    /// one pattern with one capture; every captured node becomes a region.
    pub fn new(
        primary: &Grammar,
        secondary: &Grammar,
        anchor_query: &str,
    ) -> Result<Self, ComposeError> {
        let anchor = PatternQuery::new(primary, anchor_query)?;
        if anchor.pattern_count() != 1 || anchor.capture_names().len() != 1 {
            return Err(ComposeError::InvalidAnchorQuery {
                patterns: anchor.pattern_count(),
                captures: anchor.capture_names().len(),
            });
        }

        Ok(Self {
            primary: SyntaxParser::new(primary).map_err(ComposeError::Setup)?,
            secondary: SyntaxParser::new(secondary).map_err(ComposeError::Setup)?,
            anchor,
            cursor: MatchCursor::new(),
            #[cfg(test)]
            before_regions: None,
        })
    }

    /// Budget applied to each constituent parse.
    pub fn set_operation_limit(&mut self, limit: Option<Duration>) {
        self.primary.set_operation_limit(limit);
        self.secondary.set_operation_limit(limit);
    }

    pub fn anchor_query(&self) -> &PatternQuery {
        &self.anchor
    }

    /// Compose `source` from scratch.
    pub fn build(
        &mut self,
        source: &[u8],
        cancel: Option<&CancellationToken>,
    ) -> Result<CompositeTree, ComposeError> {
        self.compose(source, None, cancel)
    }

    /// Compose `source` incrementally.
    ///
    /// `previous` must already have seen every edit between its source and
    /// `source` (see [`CompositeTree::edit`]). Its secondary trees are
    /// reused by position: region *i* of the new document starts from
    /// region *i* of the previous one.
    pub fn rebuild(
        &mut self,
        previous: &CompositeTree,
        source: &[u8],
        cancel: Option<&CancellationToken>,
    ) -> Result<CompositeTree, ComposeError> {
        self.compose(source, Some(previous), cancel)
    }

    fn compose(
        &mut self,
        source: &[u8],
        previous: Option<&CompositeTree>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompositeTree, ComposeError> {
        let primary = self
            .primary
            .parse(source, previous.map(|p| &p.primary), cancel)
            .map_err(ComposeError::Primary)?;

        let mut regions = Vec::new();
        for m in self.cursor.matches(&self.anchor, primary.root_node()) {
            if !self.anchor.satisfies(&m, source) {
                continue;
            }
            for capture in &m.captures {
                regions.push((
                    capture.node.id(),
                    capture.node.range(),
                    node_covering_ranges(capture.node),
                ));
            }
        }

        #[cfg(test)]
        if let Some(hook) = &self.before_regions {
            hook();
        }

        let mut secondaries = Vec::with_capacity(regions.len());
        let mut index = HashMap::with_capacity(regions.len());
        for (ordinal, (node_id, anchor_range, ranges)) in regions.into_iter().enumerate() {
            let old = previous
                .and_then(|p| p.secondaries.get(ordinal))
                .map(|s| &s.tree);
            let tree = self
                .secondary
                .parse_ranges(source, old, &ranges, cancel)
                .map_err(|err| ComposeError::Secondary {
                    ordinal,
                    source: err,
                })?;

            index.insert(node_id, ordinal);
            secondaries.push(SecondaryTree {
                tree,
                anchor_range,
                ranges,
                ordinal,
                reused: old.is_some(),
            });
        }

        debug!(
            regions = secondaries.len(),
            reused = secondaries.iter().filter(|s| s.reused).count(),
            "composed document"
        );

        Ok(CompositeTree {
            primary,
            secondaries,
            index,
        })
    }
}

/// A secondary tree and the region it was parsed from.
#[derive(Debug, Clone)]
pub struct SecondaryTree {
    tree: Tree,
    anchor_range: Range,
    ranges: Vec<Range>,
    ordinal: usize,
    reused: bool,
}

impl SecondaryTree {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Span of the anchor node in the primary tree.
    pub fn anchor_range(&self) -> Range {
        self.anchor_range
    }

    /// The bytes the secondary grammar was allowed to see.
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Position among the document's regions, in traversal order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Whether the parse started from the previous generation's tree at
    /// the same ordinal.
    pub fn reused(&self) -> bool {
        self.reused
    }
}

/// A primary tree plus the secondary trees anchored in it.
///
/// Lookups by node are keyed on node identity, which is only meaningful
/// for nodes of this generation's primary tree.
#[derive(Debug, Clone)]
pub struct CompositeTree {
    primary: Tree,
    secondaries: Vec<SecondaryTree>,
    index: HashMap<usize, usize>,
}

impl CompositeTree {
    pub fn primary_tree(&self) -> &Tree {
        &self.primary
    }

    pub fn root_node(&self) -> Node<'_> {
        self.primary.root_node()
    }

    pub fn secondary_trees(&self) -> &[SecondaryTree] {
        &self.secondaries
    }

    /// The secondary tree anchored at `node`, if any.
    pub fn secondary_tree(&self, node: Node<'_>) -> Option<&SecondaryTree> {
        self.index
            .get(&node.id())
            .and_then(|&ordinal| self.secondaries.get(ordinal))
    }

    pub fn secondary_root(&self, node: Node<'_>) -> Option<Node<'_>> {
        self.secondary_tree(node).map(SecondaryTree::root_node)
    }

    /// Apply `edit` to the primary tree and every secondary tree.
    pub fn edit(&mut self, edit: &TextEdit) {
        edit.apply(&mut self.primary);
        for secondary in &mut self.secondaries {
            edit.apply(&mut secondary.tree);
        }
    }
}
