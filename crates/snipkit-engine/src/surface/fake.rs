use super::{
    EventKind, EventTarget, SurfaceId, SurfaceKind, TextAndCaret, TextSurface, UndoSnapshot,
};

/// A surface with no host behind it, recording every selection it is given.
pub(crate) struct FakeSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    pub text: String,
    pub selection: (usize, usize),
    pub focused: bool,
    pub selections: Vec<(usize, usize)>,
    events: EventTarget,
}

impl FakeSurface {
    pub fn new(kind: SurfaceKind, text: &str) -> Self {
        Self {
            id: SurfaceId::next(),
            kind,
            text: text.to_string(),
            selection: (text.len(), text.len()),
            focused: true,
            selections: Vec::new(),
            events: EventTarget::new(),
        }
    }
}

impl TextSurface for FakeSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn text_and_caret(&self) -> Option<TextAndCaret> {
        Some(TextAndCaret {
            text: self.text.clone(),
            caret: self.selection.0,
        })
    }

    fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection;
        (start < end).then(|| self.text[start..end].to_string())
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.text.replace_range(start..end, text);
        self.selection = (start + text.len(), start + text.len());
        self.events.dispatch(EventKind::Input);
    }

    fn set_caret(&mut self, offset: usize) {
        self.select_range(offset, offset);
    }

    fn select_range(&mut self, start: usize, end: usize) {
        self.selection = (start, end);
        self.selections.push((start, end));
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn snapshot(&self) -> UndoSnapshot {
        UndoSnapshot::Native {
            original_value: self.text.clone(),
            selection_start: self.selection.0,
            selection_end: self.selection.1,
        }
    }

    fn restore(&mut self, snapshot: &UndoSnapshot) -> bool {
        match snapshot {
            UndoSnapshot::Native {
                original_value,
                selection_start,
                selection_end,
            } => {
                self.text = original_value.clone();
                self.selection = (*selection_start, *selection_end);
                true
            }
            UndoSnapshot::Contenteditable { .. } => false,
        }
    }

    fn events(&self) -> &EventTarget {
        &self.events
    }
}
