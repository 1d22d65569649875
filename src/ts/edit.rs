use crate::ts::errors::EditError;
use tree_sitter::{InputEdit, Point, Tree};

/// One contiguous text replacement, in both byte and row/column
/// coordinates.
///
/// Every tree that shares the edited document's coordinate space must see
/// the same edit before the next incremental parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    input: InputEdit,
}

impl TextEdit {
    pub fn new(input: InputEdit) -> Self {
        Self { input }
    }

    /// Replace `old_source[start..old_end]` with `new_text`.
    ///
    /// Returns the edit descriptor together with the updated source.
    pub fn replace(
        old_source: &[u8],
        start: usize,
        old_end: usize,
        new_text: &[u8],
    ) -> Result<(Self, Vec<u8>), EditError> {
        if start > old_end || old_end > old_source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: start,
                byte_end: old_end,
                source_len: old_source.len(),
            });
        }

        let mut new_source = Vec::with_capacity(old_source.len() - (old_end - start) + new_text.len());
        new_source.extend_from_slice(&old_source[..start]);
        new_source.extend_from_slice(new_text);
        new_source.extend_from_slice(&old_source[old_end..]);

        let new_end = start + new_text.len();
        let input = InputEdit {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: new_end,
            start_position: point_at(old_source, start),
            old_end_position: point_at(old_source, old_end),
            new_end_position: point_at(&new_source, new_end),
        };

        Ok((Self { input }, new_source))
    }

    /// Shift and stretch the tree's node boundaries to match this edit.
    pub fn apply(&self, tree: &mut Tree) {
        tree.edit(&self.input);
    }

    pub fn input_edit(&self) -> &InputEdit {
        &self.input
    }

    pub fn start_byte(&self) -> usize {
        self.input.start_byte
    }

    pub fn old_end_byte(&self) -> usize {
        self.input.old_end_byte
    }

    pub fn new_end_byte(&self) -> usize {
        self.input.new_end_byte
    }
}

impl From<InputEdit> for TextEdit {
    fn from(input: InputEdit) -> Self {
        Self::new(input)
    }
}

/// Row/column of a byte offset. Columns count bytes, as the engine does.
pub fn point_at(source: &[u8], offset: usize) -> Point {
    let prefix = &source[..offset.min(source.len())];
    let row = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |idx| idx + 1);
    Point::new(row, prefix.len() - line_start)
}
