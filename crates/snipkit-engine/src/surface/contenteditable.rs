use super::{
    EventKind, EventTarget, SurfaceId, SurfaceKind, TextAndCaret, TextSurface, UndoSnapshot,
};
use crate::dom::{locate, offset_of, Document, Fragment, NodeId, Range};

/// What detection saw in a contenteditable region: the text from the start of
/// the region up to the caret, plus the selection at that moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContenteditableContext {
    pub text: String,
    pub cursor_position: usize,
    pub range: Range,
}

/// A contenteditable element: text spread over a tree of nodes with no
/// native value or selection offsets.
pub struct ContenteditableSurface {
    id: SurfaceId,
    doc: Document,
    root: NodeId,
    selection: Option<Range>,
    focused: bool,
    events: EventTarget,
}

impl ContenteditableSurface {
    /// A focused region holding `fragments`, caret at the end.
    pub fn new(fragments: &[Fragment]) -> Self {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.replace_children(root, fragments);
        let mut surface = Self {
            id: SurfaceId::next(),
            doc,
            root,
            selection: None,
            focused: true,
            events: EventTarget::new(),
        };
        surface.position_cursor_at_offset(usize::MAX);
        surface
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn inner_html(&self) -> String {
        self.doc.inner_html(self.root)
    }

    pub fn text_content(&self) -> String {
        self.doc.text_content(self.root)
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Range>) {
        self.selection = selection;
    }

    /// Reads the text up to the caret.
    ///
    /// `None` when nothing is selected or the selection is outside the region.
    pub fn context(&self) -> Option<ContenteditableContext> {
        let range = self.selection?;
        let cursor_position = offset_of(&self.doc, self.root, range.start)?;
        let text = self.doc.text_content(self.root);
        let text = text.get(..cursor_position).unwrap_or(&text).to_string();
        Some(ContenteditableContext {
            text,
            cursor_position,
            range,
        })
    }

    /// Replaces linear `start..end` with `new_text`, newlines becoming `<br>`,
    /// and puts the caret right after the inserted content.
    pub fn replace_text(&mut self, start: usize, end: usize, new_text: &str) {
        let total = self.doc.text_len(self.root);
        let start = start.min(total);
        let end = end.clamp(start, total);
        self.doc.delete_text(self.root, start, end);
        self.doc.insert_text(self.root, start, new_text);
        self.position_cursor_at_offset(start + new_text.len());
        self.events.dispatch(EventKind::Input);
    }

    /// Collapses the selection at linear `offset`; past the end means the end.
    pub fn position_cursor_at_offset(&mut self, offset: usize) {
        let position = locate(&self.doc, self.root, offset);
        self.selection = Some(Range::collapsed(position));
    }

    pub fn select_offsets(&mut self, start: usize, end: usize) {
        self.selection = Some(Range {
            start: locate(&self.doc, self.root, start),
            end: locate(&self.doc, self.root, end.max(start)),
        });
    }

    pub fn store_undo(&self) -> UndoSnapshot {
        UndoSnapshot::Contenteditable {
            fragments: self.doc.to_fragments(self.root),
            text_length: self.doc.text_len(self.root),
        }
    }

    /// Puts the snapshot content back and leaves the caret at the end; the
    /// caret position from before the expansion is not reconstructed.
    pub fn restore_undo(&mut self, snapshot: &UndoSnapshot) -> bool {
        let UndoSnapshot::Contenteditable {
            fragments,
            text_length,
        } = snapshot
        else {
            return false;
        };
        self.doc.replace_children(self.root, fragments);
        self.position_cursor_at_offset(*text_length);
        self.events.dispatch(EventKind::Input);
        true
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    fn offsets(&self, range: Range) -> Option<(usize, usize)> {
        let start = offset_of(&self.doc, self.root, range.start)?;
        let end = offset_of(&self.doc, self.root, range.end)?;
        Some((start.min(end), start.max(end)))
    }
}

impl TextSurface for ContenteditableSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Contenteditable
    }

    fn text_and_caret(&self) -> Option<TextAndCaret> {
        let (caret, _) = self.offsets(self.selection?)?;
        Some(TextAndCaret {
            text: self.text_content(),
            caret,
        })
    }

    fn selected_text(&self) -> Option<String> {
        let (start, end) = self.offsets(self.selection?)?;
        if start == end {
            return None;
        }
        self.text_content().get(start..end).map(str::to_string)
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.replace_text(start, end, text);
    }

    fn set_caret(&mut self, offset: usize) {
        self.position_cursor_at_offset(offset);
    }

    fn select_range(&mut self, start: usize, end: usize) {
        self.select_offsets(start, end);
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn snapshot(&self) -> UndoSnapshot {
        self.store_undo()
    }

    fn restore(&mut self, snapshot: &UndoSnapshot) -> bool {
        self.restore_undo(snapshot)
    }

    fn events(&self) -> &EventTarget {
        &self.events
    }
}
