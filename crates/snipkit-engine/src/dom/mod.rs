//! Minimal DOM model backing contenteditable surfaces.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Removed nodes stay in the arena but are unreachable from any
//! root, which is how a stale selection ends up "outside the element".
//!
//! The linear text of a subtree is the concatenation of its text nodes with
//! every `<br>` counted as a single `"\n"`. All offsets are byte offsets into
//! that linear text.

mod locate;

pub use locate::{locate, offset_of, Position, Range};

pub type RawNodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub RawNodeId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned subtree, used to build content and to snapshot it for undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Element {
        tag: String,
        children: Vec<Fragment>,
    },
    Text(String),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<Fragment>) -> Self {
        Fragment::Element {
            tag: tag.into(),
            children,
        }
    }

    pub fn line_break() -> Self {
        Fragment::element("br", vec![])
    }
}

/// A text-bearing leaf in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Leaf {
    pub node: NodeId,
    pub len: usize,
    pub is_line_break: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element { tag: tag.into() })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text { text: text.into() })
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as RawNodeId);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeKind::Text { text } = &mut self.data_mut(id).kind {
            *text = value.into();
        }
    }

    pub fn is_line_break(&self, id: NodeId) -> bool {
        matches!(&self.data(id).kind, NodeKind::Element { tag } if tag.eq_ignore_ascii_case("br"))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Inserts `child` at `index` (clamped), detaching it from any old parent.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.data_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.data_mut(child).parent = Some(parent);
    }

    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.data_mut(node).parent.take() {
            self.data_mut(parent).children.retain(|&c| c != node);
        }
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    /// True if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Text and `<br>` leaves under `root`, in document order.
    pub(crate) fn leaves(&self, root: NodeId) -> Vec<Leaf> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.is_line_break(node) {
                out.push(Leaf {
                    node,
                    len: 1,
                    is_line_break: true,
                });
                continue;
            }
            match &self.data(node).kind {
                NodeKind::Text { text } => out.push(Leaf {
                    node,
                    len: text.len(),
                    is_line_break: false,
                }),
                NodeKind::Element { .. } => stack.extend(self.children(node).iter().rev()),
            }
        }
        out
    }

    /// Linear text of the subtree.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut out = String::new();
        for leaf in self.leaves(root) {
            match self.text(leaf.node) {
                Some(text) => out.push_str(text),
                None => out.push('\n'),
            }
        }
        out
    }

    pub fn text_len(&self, root: NodeId) -> usize {
        self.leaves(root).iter().map(|leaf| leaf.len).sum()
    }

    /// Serializes the children of `root` as HTML.
    pub fn inner_html(&self, root: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(root) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.data(node).kind {
            NodeKind::Text { text } => {
                for ch in text.chars() {
                    match ch {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        _ => out.push(ch),
                    }
                }
            }
            NodeKind::Element { tag } if self.is_line_break(node) => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
            }
            NodeKind::Element { tag } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                for &child in self.children(node) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Creates the nodes for `fragment` (detached) and returns its root.
    pub fn build(&mut self, fragment: &Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.create_text(text.clone()),
            Fragment::Element { tag, children } => {
                let element = self.create_element(tag.clone());
                for child in children {
                    let child = self.build(child);
                    self.append_child(element, child);
                }
                element
            }
        }
    }

    /// Owned copies of the children of `root`.
    pub fn to_fragments(&self, root: NodeId) -> Vec<Fragment> {
        self.children(root)
            .iter()
            .map(|&child| self.to_fragment(child))
            .collect()
    }

    fn to_fragment(&self, node: NodeId) -> Fragment {
        match &self.data(node).kind {
            NodeKind::Text { text } => Fragment::Text(text.clone()),
            NodeKind::Element { tag } => Fragment::Element {
                tag: tag.clone(),
                children: self.to_fragments(node),
            },
        }
    }

    /// Replaces everything under `root` with freshly built `fragments`.
    pub fn replace_children(&mut self, root: NodeId, fragments: &[Fragment]) {
        for child in self.children(root).to_vec() {
            self.detach(child);
        }
        for fragment in fragments {
            let child = self.build(fragment);
            self.append_child(root, child);
        }
    }

    /// Deletes the linear text in `start..end`, removing `<br>`s fully inside.
    pub fn delete_text(&mut self, root: NodeId, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let mut consumed = 0;
        for leaf in self.leaves(root) {
            let (leaf_start, leaf_end) = (consumed, consumed + leaf.len);
            consumed = leaf_end;
            if leaf_end <= start || leaf_start >= end {
                continue;
            }
            if leaf.is_line_break {
                self.detach(leaf.node);
                continue;
            }
            if let NodeKind::Text { text } = &mut self.data_mut(leaf.node).kind {
                let from = clamp_to_char_boundary(text, start.saturating_sub(leaf_start));
                let to = clamp_to_char_boundary(text, end - leaf_start);
                text.replace_range(from..to, "");
            }
        }
    }

    /// Inserts `text` at linear `offset`, turning each `"\n"` into a `<br>`.
    pub fn insert_text(&mut self, root: NodeId, offset: usize, text: &str) {
        let (parent, mut index) = self.split_at(root, offset);
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let br = self.create_element("br");
                self.insert_child(parent, index, br);
                index += 1;
            }
            if !line.is_empty() {
                let node = self.create_text(line);
                self.insert_child(parent, index, node);
                index += 1;
            }
        }
    }

    /// Resolves `offset` to a child slot, splitting a text node if needed.
    fn split_at(&mut self, root: NodeId, offset: usize) -> (NodeId, usize) {
        let position = locate(self, root, offset);
        let Some(text) = self.text(position.node).map(str::to_string) else {
            return (position.node, position.offset);
        };
        let Some(parent) = self.parent(position.node) else {
            return (root, self.children(root).len());
        };
        let index = self.index_in_parent(position.node).unwrap_or(0);
        if position.offset == 0 {
            return (parent, index);
        }
        if position.offset < text.len() {
            let (head, tail) = text.split_at(position.offset);
            let tail = self.create_text(tail);
            self.set_text(position.node, head);
            self.insert_child(parent, index + 1, tail);
        }
        (parent, index + 1)
    }
}

/// Clamps `index` to the string length and back onto a char boundary.
pub(crate) fn clamp_to_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
