//! Text-editing hosts the engine can expand into.
//!
//! A [`TextSurface`] is either a native form field ([`NativeFieldSurface`]) or
//! a contenteditable region ([`ContenteditableSurface`]). Detection, expansion
//! and tab-stop navigation only talk to the trait, so none of them branch on
//! which host they are driving.

mod contenteditable;
mod events;
#[cfg(test)]
mod fake;
mod native;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dom::Fragment;

pub use contenteditable::{ContenteditableContext, ContenteditableSurface};
pub use events::{EventKind, EventTarget, Key, KeyDisposition, KeyEvent, Subscription};
pub use native::NativeFieldSurface;

#[cfg(test)]
pub(crate) use fake::FakeSurface;

/// Identity of a surface, used to key per-element state such as undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    /// `<input>`: Enter confirms rather than inserting a newline.
    SingleLine,
    /// `<textarea>`.
    MultiLine,
    Contenteditable,
}

/// The surface text with the caret position in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextAndCaret {
    pub text: String,
    pub caret: usize,
}

impl TextAndCaret {
    /// Text from the start of the surface up to the caret.
    pub fn before_caret(&self) -> &str {
        &self.text[..crate::dom::clamp_to_char_boundary(&self.text, self.caret)]
    }
}

/// State captured before an expansion, restored by undo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndoSnapshot {
    Native {
        original_value: String,
        selection_start: usize,
        selection_end: usize,
    },
    Contenteditable {
        fragments: Vec<Fragment>,
        text_length: usize,
    },
}

pub trait TextSurface {
    fn id(&self) -> SurfaceId;

    fn kind(&self) -> SurfaceKind;

    /// `None` when there is no caret inside the surface.
    fn text_and_caret(&self) -> Option<TextAndCaret>;

    /// The currently selected text, if the selection is not collapsed.
    fn selected_text(&self) -> Option<String>;

    /// Replaces `start..end` with `text`, leaves the caret after it and
    /// notifies `input` listeners.
    fn replace_range(&mut self, start: usize, end: usize, text: &str);

    fn set_caret(&mut self, offset: usize);

    fn select_range(&mut self, start: usize, end: usize);

    fn has_focus(&self) -> bool;

    fn snapshot(&self) -> UndoSnapshot;

    /// Restores `snapshot`; `false` if it was taken from the other kind of
    /// surface.
    fn restore(&mut self, snapshot: &UndoSnapshot) -> bool;

    fn events(&self) -> &EventTarget;
}
