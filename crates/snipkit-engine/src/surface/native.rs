use super::{
    EventKind, EventTarget, SurfaceId, SurfaceKind, TextAndCaret, TextSurface, UndoSnapshot,
};
use crate::dom::clamp_to_char_boundary;

/// An `<input>` or `<textarea>`: a flat value plus a selection range.
pub struct NativeFieldSurface {
    id: SurfaceId,
    value: String,
    selection_start: usize,
    selection_end: usize,
    multiline: bool,
    focused: bool,
    events: EventTarget,
}

impl NativeFieldSurface {
    /// A focused single-line field with the caret at the end.
    pub fn input(value: impl Into<String>) -> Self {
        Self::with_value(value.into(), false)
    }

    /// A focused multi-line field with the caret at the end.
    pub fn textarea(value: impl Into<String>) -> Self {
        Self::with_value(value.into(), true)
    }

    fn with_value(value: String, multiline: bool) -> Self {
        let end = value.len();
        Self {
            id: SurfaceId::next(),
            value,
            selection_start: end,
            selection_end: end,
            multiline,
            focused: true,
            events: EventTarget::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn selection_start(&self) -> usize {
        self.selection_start
    }

    pub fn selection_end(&self) -> usize {
        self.selection_end
    }

    /// Clamps both ends to the value and orders them.
    pub fn set_selection_range(&mut self, start: usize, end: usize) {
        let start = clamp_to_char_boundary(&self.value, start);
        let end = clamp_to_char_boundary(&self.value, end);
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
    }

    /// Types `text` over the selection, the way a keystroke would.
    pub fn type_text(&mut self, text: &str) {
        let (start, end) = (self.selection_start, self.selection_end);
        self.replace_range(start, end, text);
    }

    /// Deletes the selection, or the character before a collapsed caret.
    pub fn delete_backward(&mut self) {
        let (start, end) = (self.selection_start, self.selection_end);
        if start != end {
            self.replace_range(start, end, "");
        } else if let Some((prev, _)) = self.value[..start].char_indices().next_back() {
            self.replace_range(prev, start, "");
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }
}

impl TextSurface for NativeFieldSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        if self.multiline {
            SurfaceKind::MultiLine
        } else {
            SurfaceKind::SingleLine
        }
    }

    fn text_and_caret(&self) -> Option<TextAndCaret> {
        Some(TextAndCaret {
            text: self.value.clone(),
            caret: self.selection_start,
        })
    }

    fn selected_text(&self) -> Option<String> {
        (self.selection_start < self.selection_end)
            .then(|| self.value[self.selection_start..self.selection_end].to_string())
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let start = clamp_to_char_boundary(&self.value, start);
        let end = clamp_to_char_boundary(&self.value, end).max(start);
        self.value.replace_range(start..end, text);
        let caret = start + text.len();
        self.set_selection_range(caret, caret);
        self.events.dispatch(EventKind::Input);
    }

    fn set_caret(&mut self, offset: usize) {
        self.set_selection_range(offset, offset);
    }

    fn select_range(&mut self, start: usize, end: usize) {
        self.set_selection_range(start, end);
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn snapshot(&self) -> UndoSnapshot {
        UndoSnapshot::Native {
            original_value: self.value.clone(),
            selection_start: self.selection_start,
            selection_end: self.selection_end,
        }
    }

    fn restore(&mut self, snapshot: &UndoSnapshot) -> bool {
        let UndoSnapshot::Native {
            original_value,
            selection_start,
            selection_end,
        } = snapshot
        else {
            return false;
        };
        self.value = original_value.clone();
        self.set_selection_range(*selection_start, *selection_end);
        self.events.dispatch(EventKind::Input);
        true
    }

    fn events(&self) -> &EventTarget {
        &self.events
    }
}
