use super::{clamp_to_char_boundary, Document, NodeId, NodeKind};

/// A DOM boundary point.
///
/// For a text node `offset` is a byte offset into its text; for an element it
/// is a child index, the point sitting just before that child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

/// A pair of boundary points; collapsed when `start == end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Maps a linear text offset under `root` to a DOM position.
///
/// An offset on the boundary between two text nodes resolves to the end of
/// the earlier one. Offsets past the end of the content resolve to the end of
/// `root`, as does any offset into an empty root.
pub fn locate(doc: &Document, root: NodeId, offset: usize) -> Position {
    let mut consumed = 0;
    for leaf in doc.leaves(root) {
        if leaf.is_line_break {
            if offset == consumed {
                if let (Some(parent), Some(index)) = (doc.parent(leaf.node), doc.index_in_parent(leaf.node)) {
                    return Position {
                        node: parent,
                        offset: index,
                    };
                }
            }
        } else if offset <= consumed + leaf.len {
            let text = doc.text(leaf.node).unwrap_or_default();
            return Position {
                node: leaf.node,
                offset: clamp_to_char_boundary(text, offset - consumed),
            };
        }
        consumed += leaf.len;
    }
    Position {
        node: root,
        offset: doc.children(root).len(),
    }
}

/// The inverse of [`locate`]: the linear offset of `position` under `root`.
///
/// Returns `None` when the position is not inside `root`.
pub fn offset_of(doc: &Document, root: NodeId, position: Position) -> Option<usize> {
    let before = prefix_len(doc, root, position.node)?;
    match doc.kind(position.node) {
        NodeKind::Text { text } => Some(before + position.offset.min(text.len())),
        NodeKind::Element { .. } => {
            let inside: usize = doc
                .children(position.node)
                .iter()
                .take(position.offset)
                .map(|&child| doc.text_len(child))
                .sum();
            Some(before + inside)
        }
    }
}

/// Linear text length preceding `target` in document order.
fn prefix_len(doc: &Document, root: NodeId, target: NodeId) -> Option<usize> {
    let mut consumed = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node == target {
            return Some(consumed);
        }
        if doc.is_line_break(node) {
            consumed += 1;
            continue;
        }
        match doc.kind(node) {
            NodeKind::Text { text } => consumed += text.len(),
            NodeKind::Element { .. } => stack.extend(doc.children(node).iter().rev()),
        }
    }
    None
}
