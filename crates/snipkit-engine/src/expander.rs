//! Splices resolved content over a trigger and keeps one undo snapshot per
//! surface.

use std::collections::HashMap;

use crate::surface::{
    ContenteditableContext, ContenteditableSurface, SurfaceId, TextSurface, UndoSnapshot,
};
use crate::trigger::TriggerMatch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Caret position inside the inserted content; defaults to its end.
    pub cursor_offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionResult {
    pub original_text: String,
    pub expanded_text: String,
    /// Where the caret was left, in the expanded text.
    pub caret: usize,
}

/// Replaces trigger spans and remembers what was there.
///
/// The undo table holds at most one snapshot per surface: each expansion
/// overwrites the previous one and a successful undo removes it.
#[derive(Debug, Default)]
pub struct TextExpander {
    undo: HashMap<SurfaceId, UndoSnapshot>,
}

impl TextExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `found` on any surface with `content`.
    pub fn expand(
        &mut self,
        surface: &mut dyn TextSurface,
        found: &TriggerMatch,
        content: &str,
        options: ExpandOptions,
    ) -> ExpansionResult {
        let original_text = surface
            .text_and_caret()
            .map(|state| state.text)
            .unwrap_or_default();
        self.undo.insert(surface.id(), surface.snapshot());

        surface.replace_range(found.start_index, found.end_index, content);
        let caret = found.start_index + caret_within(content, options);
        surface.set_caret(caret);

        let expanded_text = surface
            .text_and_caret()
            .map(|state| state.text)
            .unwrap_or_default();
        ExpansionResult {
            original_text,
            expanded_text,
            caret,
        }
    }

    /// Replaces `found` in a contenteditable region using the context captured
    /// at detection time.
    ///
    /// Returns `None` without touching the region when its selection has moved
    /// since `context` was read.
    pub fn expand_contenteditable(
        &mut self,
        surface: &mut ContenteditableSurface,
        found: &TriggerMatch,
        content: &str,
        context: &ContenteditableContext,
        options: ExpandOptions,
    ) -> Option<ExpansionResult> {
        if surface.selection() != Some(context.range) {
            return None;
        }
        let original_text = surface.text_content();
        self.undo.insert(surface.id(), surface.store_undo());

        surface.replace_text(found.start_index, found.end_index, content);
        let caret = found.start_index + caret_within(content, options);
        if options.cursor_offset.is_some() {
            surface.position_cursor_at_offset(caret);
        }

        Some(ExpansionResult {
            original_text,
            expanded_text: surface.text_content(),
            caret,
        })
    }

    /// Restores the snapshot taken by the last expansion of `surface`.
    ///
    /// `false` when there is nothing to undo.
    pub fn undo(&mut self, surface: &mut dyn TextSurface) -> bool {
        match self.undo.remove(&surface.id()) {
            Some(snapshot) => surface.restore(&snapshot),
            None => false,
        }
    }

    pub fn has_undo(&self, surface: SurfaceId) -> bool {
        self.undo.contains_key(&surface)
    }

    /// Drops the snapshot for a surface that went away.
    pub fn forget(&mut self, surface: SurfaceId) {
        self.undo.remove(&surface);
    }
}

fn caret_within(content: &str, options: ExpandOptions) -> usize {
    options.cursor_offset.map_or(content.len(), |offset| offset.min(content.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;
    use crate::surface::NativeFieldSurface;
    use crate::trigger::detect_trigger_at_cursor;
    use pretty_assertions::assert_eq;

    fn span(start_index: usize, end_index: usize) -> TriggerMatch {
        TriggerMatch {
            trigger: String::new(),
            start_index,
            end_index,
        }
    }

    #[test]
    fn expands_and_leaves_caret_after_content() {
        let mut expander = TextExpander::new();
        let mut field = NativeFieldSurface::input("hello /ab ");
        let found = detect_trigger_at_cursor(field.value(), field.selection_start()).unwrap();

        let result = expander.expand(&mut field, &found, "world", ExpandOptions::default());

        assert_eq!(result.original_text, "hello /ab ");
        assert_eq!(result.expanded_text, "hello world");
        assert_eq!(field.selection_start(), 11);
        assert_eq!(field.selection_end(), 11);
    }

    #[test]
    fn cursor_offset_places_caret_inside_content() {
        let mut expander = TextExpander::new();
        let mut field = NativeFieldSurface::textarea("x /fn tail");
        field.set_caret(6);

        let options = ExpandOptions {
            cursor_offset: Some(3),
        };
        let result = expander.expand(&mut field, &span(2, 6), "fn() {}", options);

        assert_eq!(field.value(), "x fn() {}tail");
        assert_eq!(result.caret, 5);
        assert_eq!(field.selection_start(), 5);
    }

    #[test]
    fn undo_round_trip_restores_exact_state() {
        let mut expander = TextExpander::new();
        let mut field = NativeFieldSurface::input("hi /ab ");
        let before = (field.value().to_string(), field.selection_start(), field.selection_end());

        expander.expand(&mut field, &span(3, 7), "expanded", ExpandOptions::default());
        assert!(expander.has_undo(field.id()));

        assert!(expander.undo(&mut field));
        assert_eq!(
            (field.value().to_string(), field.selection_start(), field.selection_end()),
            before
        );
        assert!(!expander.has_undo(field.id()));

        assert!(!expander.undo(&mut field));
        assert_eq!(field.value(), "hi /ab ");
    }

    #[test]
    fn each_expansion_overwrites_the_snapshot() {
        let mut expander = TextExpander::new();
        let mut field = NativeFieldSurface::input("/a1 ");
        expander.expand(&mut field, &span(0, 4), "one ", ExpandOptions::default());
        field.type_text("/a2 ");
        expander.expand(&mut field, &span(4, 8), "two", ExpandOptions::default());

        assert!(expander.undo(&mut field));
        assert_eq!(field.value(), "one /a2 ");
        assert!(!expander.undo(&mut field));
    }

    #[test]
    fn snapshots_are_per_surface() {
        let mut expander = TextExpander::new();
        let mut first = NativeFieldSurface::input("/ab ");
        let mut second = NativeFieldSurface::input("untouched");
        expander.expand(&mut first, &span(0, 4), "x", ExpandOptions::default());

        assert!(!expander.undo(&mut second));
        assert!(expander.undo(&mut first));
    }

    #[test]
    fn contenteditable_expansion_and_undo() {
        let mut expander = TextExpander::new();
        let mut region = ContenteditableSurface::new(&[
            Fragment::element("p", vec![Fragment::text("Thanks ")]),
            Fragment::text("/sig "),
        ]);
        let context = region.context().unwrap();

        let result = expander
            .expand_contenteditable(
                &mut region,
                &span(7, 12),
                "Ada\nLovelace",
                &context,
                ExpandOptions::default(),
            )
            .unwrap();

        assert_eq!(result.expanded_text, "Thanks Ada\nLovelace");
        insta::assert_snapshot!(region.inner_html(), @"<p>Thanks Ada<br>Lovelace</p>");

        assert!(expander.undo(&mut region));
        assert_eq!(region.inner_html(), "<p>Thanks </p>/sig ");
        assert!(!expander.undo(&mut region));
    }

    #[test]
    fn stale_contenteditable_context_is_rejected() {
        let mut expander = TextExpander::new();
        let mut region = ContenteditableSurface::new(&[Fragment::text("go /ab ")]);
        let context = region.context().unwrap();
        region.position_cursor_at_offset(1);

        let result = expander.expand_contenteditable(
            &mut region,
            &span(3, 7),
            "x",
            &context,
            ExpandOptions::default(),
        );

        assert_eq!(result, None);
        assert_eq!(region.text_content(), "go /ab ");
        assert!(!expander.has_undo(region.id()));
    }
}
