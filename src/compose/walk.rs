use crate::compose::composite::CompositeTree;
use tree_sitter::Node;

/// A primary node together with the root of the secondary tree anchored
/// at it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeNode<'a> {
    pub node: Node<'a>,
    pub secondary: Option<Node<'a>>,
}

/// Depth-first, pre-order walk over the named nodes of the primary tree.
pub struct Walk<'a> {
    composite: &'a CompositeTree,
    stack: Vec<Node<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = CompositeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        self.stack.extend(children.into_iter().rev());

        Some(CompositeNode {
            node,
            secondary: self.composite.secondary_root(node),
        })
    }
}

impl CompositeTree {
    /// Walk the primary tree, pairing each node with its secondary root.
    ///
    /// Stop early by breaking out of the loop.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            composite: self,
            stack: vec![self.root_node()],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compose::Composer;
    use crate::grammar::builtin;

    #[test]
    fn walk_visits_named_nodes_in_document_order() {
        let mut composer =
            Composer::new(&builtin::markdown(), &builtin::markdown_inline(), "(inline) @inline")
                .unwrap();
        let composite = composer.build(b"# Title\n\nBody `code`.\n", None).unwrap();

        let visited: Vec<_> = composite.walk().collect();
        assert_eq!(visited[0].node.kind(), "document");

        let anchored: Vec<_> = visited
            .iter()
            .filter_map(|n| n.secondary.map(|root| (n.node.kind(), root.kind())))
            .collect();
        assert_eq!(anchored, [("inline", "inline"), ("inline", "inline")]);

        let starts: Vec<_> = visited.iter().map(|n| n.node.start_byte()).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn walk_stops_early() {
        let mut composer =
            Composer::new(&builtin::markdown(), &builtin::markdown_inline(), "(inline) @inline")
                .unwrap();
        let composite = composer.build(b"a\n\nb\n\nc\n", None).unwrap();
        let first_anchor = composite.walk().find(|n| n.secondary.is_some()).unwrap();
        assert_eq!(first_anchor.node.start_byte(), 0);
    }
}
