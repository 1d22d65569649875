use tree_sitter::{Node, Range};

/// The parts of `anchor` not covered by any of `children`.
///
/// Children must be ordered and lie inside the anchor. Empty gaps are
/// dropped. If the children cover the whole anchor the result is a single
/// empty range at the anchor's end: an empty range set would make the
/// engine parse the entire document instead of nothing.
pub fn covering_ranges<I>(anchor: Range, children: I) -> Vec<Range>
where
    I: IntoIterator<Item = Range>,
{
    let mut ranges = Vec::new();
    let mut cursor = (anchor.start_byte, anchor.start_point);

    for child in children {
        if child.start_byte > cursor.0 {
            ranges.push(Range {
                start_byte: cursor.0,
                start_point: cursor.1,
                end_byte: child.start_byte,
                end_point: child.start_point,
            });
        }
        if child.end_byte > cursor.0 {
            cursor = (child.end_byte, child.end_point);
        }
    }

    if anchor.end_byte > cursor.0 {
        ranges.push(Range {
            start_byte: cursor.0,
            start_point: cursor.1,
            end_byte: anchor.end_byte,
            end_point: anchor.end_point,
        });
    }

    if ranges.is_empty() {
        ranges.push(Range {
            start_byte: anchor.end_byte,
            start_point: anchor.end_point,
            end_byte: anchor.end_byte,
            end_point: anchor.end_point,
        });
    }

    ranges
}

/// Covering ranges of `node` with respect to its named children.
pub fn node_covering_ranges(node: Node<'_>) -> Vec<Range> {
    let mut cursor = node.walk();
    let children: Vec<Range> = node
        .named_children(&mut cursor)
        .map(|child| child.range())
        .collect();
    covering_ranges(node.range(), children)
}
