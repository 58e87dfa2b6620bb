//! Post-expansion navigation between `<tab:N>` stops.
//!
//! The manager is either inactive or holds a [`TabStopState`] for one
//! surface. While active it owns a keydown and a blur [`Subscription`] on that
//! surface; every way out of the active state drops the state, which drops
//! both subscriptions with it.

use std::time::{Duration, Instant};

use crate::placeholder::TabStopDefinition;
use crate::surface::{
    EventKind, Key, KeyDisposition, KeyEvent, Subscription, SurfaceId, SurfaceKind, TextSurface,
};

/// How long a blur must stand before the manager believes focus really left.
pub const BLUR_DEBOUNCE: Duration = Duration::from_millis(100);

pub struct TabStopState {
    surface: SurfaceId,
    surface_kind: SurfaceKind,
    tab_stops: Vec<TabStopDefinition>,
    current_index: usize,
    base_offset: usize,
    pending_blur: Option<Instant>,
    _keydown: Subscription,
    _blur: Subscription,
}

impl TabStopState {
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn tab_stops(&self) -> &[TabStopDefinition] {
        &self.tab_stops
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    pub fn is_contenteditable(&self) -> bool {
        self.surface_kind == SurfaceKind::Contenteditable
    }

    fn current(&self) -> Option<&TabStopDefinition> {
        self.tab_stops.get(self.current_index)
    }

    /// Absolute range of the current stop in the surface text.
    fn current_range(&self) -> Option<(usize, usize)> {
        self.current().map(|stop| {
            (
                self.base_offset + stop.start_offset,
                self.base_offset + stop.end_offset,
            )
        })
    }
}

#[derive(Default)]
pub struct TabStopManager {
    state: Option<TabStopState>,
}

impl TabStopManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts navigation on `surface` and selects the first stop.
    ///
    /// Any previous session is ended first. Does nothing else when
    /// `tab_stops` is empty. Stop offsets are relative to `base_offset`.
    pub fn activate(
        &mut self,
        surface: &mut dyn TextSurface,
        tab_stops: Vec<TabStopDefinition>,
        base_offset: usize,
    ) {
        self.deactivate();
        if tab_stops.is_empty() {
            return;
        }
        log::debug!("activating {} tab stops at offset {base_offset}", tab_stops.len());
        let events = surface.events();
        let state = TabStopState {
            surface: surface.id(),
            surface_kind: surface.kind(),
            tab_stops,
            current_index: 0,
            base_offset,
            pending_blur: None,
            _keydown: events.capture(EventKind::KeyDown),
            _blur: events.capture(EventKind::Blur),
        };
        if let Some((start, end)) = state.current_range() {
            surface.select_range(start, end);
        }
        self.state = Some(state);
    }

    /// Ends navigation. Safe to call when already inactive.
    pub fn deactivate(&mut self) {
        if self.state.take().is_some() {
            log::debug!("tab stops deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&TabStopState> {
        self.state.as_ref()
    }

    pub fn current_stop(&self) -> Option<&TabStopDefinition> {
        self.state.as_ref().and_then(TabStopState::current)
    }

    /// Handles a keydown on `surface`.
    ///
    /// Keys are only claimed while active on that same surface.
    pub fn handle_key(&mut self, surface: &mut dyn TextSurface, key: &KeyEvent) -> KeyDisposition {
        let Some(state) = self.state.as_mut() else {
            return KeyDisposition::PassThrough;
        };
        if state.surface != surface.id() {
            return KeyDisposition::PassThrough;
        }

        match key.key {
            Key::Tab if key.shift => {
                state.current_index = state.current_index.saturating_sub(1);
                if let Some((start, end)) = state.current_range() {
                    surface.select_range(start, end);
                }
                KeyDisposition::Consumed
            }
            Key::Tab => {
                state.current_index += 1;
                if let Some((start, end)) = state.current_range() {
                    surface.select_range(start, end);
                } else {
                    if let Some(last) = state.tab_stops.last() {
                        surface.set_caret(state.base_offset + last.end_offset);
                    }
                    self.deactivate();
                }
                KeyDisposition::Consumed
            }
            Key::Escape => {
                self.deactivate();
                KeyDisposition::PassThrough
            }
            Key::Enter if state.surface_kind == SurfaceKind::SingleLine => {
                self.deactivate();
                KeyDisposition::Consumed
            }
            _ => KeyDisposition::PassThrough,
        }
    }

    /// Records a blur; [`poll`](Self::poll) decides later whether it stuck.
    pub fn handle_blur(&mut self, at: Instant) {
        if let Some(state) = self.state.as_mut() {
            state.pending_blur = Some(at);
        }
    }

    /// Settles a pending blur once [`BLUR_DEBOUNCE`] has passed: deactivates if
    /// `surface` no longer has focus, otherwise forgets the blur.
    pub fn poll(&mut self, surface: &dyn TextSurface, now: Instant) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.surface != surface.id() {
            return;
        }
        let Some(blurred_at) = state.pending_blur else {
            return;
        };
        if now.duration_since(blurred_at) < BLUR_DEBOUNCE {
            return;
        }
        state.pending_blur = None;
        if !surface.has_focus() {
            self.deactivate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::FakeSurface;
    use pretty_assertions::assert_eq;

    fn stop(index: u32, start_offset: usize, end_offset: usize) -> TabStopDefinition {
        TabStopDefinition {
            index,
            default_value: None,
            start_offset,
            end_offset,
        }
    }

    /// "Hi NAME, re TOPIC" expanded at offset 4.
    fn active_on(kind: SurfaceKind) -> (TabStopManager, FakeSurface) {
        let mut surface = FakeSurface::new(kind, ">>> Hi NAME, re TOPIC");
        let mut manager = TabStopManager::new();
        manager.activate(&mut surface, vec![stop(1, 3, 7), stop(2, 12, 17)], 4);
        (manager, surface)
    }

    #[test]
    fn activation_selects_first_stop_and_captures_events() {
        let (manager, surface) = active_on(SurfaceKind::MultiLine);
        assert!(manager.is_active());
        assert_eq!(surface.selections, vec![(7, 11)]);
        assert!(surface.events().has_listener(EventKind::KeyDown));
        assert!(surface.events().has_listener(EventKind::Blur));
    }

    #[test]
    fn empty_stops_stay_inactive() {
        let mut surface = FakeSurface::new(SurfaceKind::SingleLine, "text");
        let mut manager = TabStopManager::new();
        manager.activate(&mut surface, vec![], 0);
        assert!(!manager.is_active());
        assert!(surface.selections.is_empty());
        assert!(!surface.events().has_listener(EventKind::KeyDown));
    }

    #[test]
    fn tab_cycles_then_exits_after_last_stop() {
        let (mut manager, mut surface) = active_on(SurfaceKind::MultiLine);
        let tab = KeyEvent::new(Key::Tab);

        assert_eq!(manager.handle_key(&mut surface, &tab), KeyDisposition::Consumed);
        assert_eq!(manager.current_stop().map(|s| s.index), Some(2));
        assert_eq!(manager.handle_key(&mut surface, &tab), KeyDisposition::Consumed);

        assert!(!manager.is_active());
        assert_eq!(surface.selections, vec![(7, 11), (16, 21), (21, 21)]);
        assert!(!surface.events().has_listener(EventKind::KeyDown));
        assert!(!surface.events().has_listener(EventKind::Blur));
    }

    #[test]
    fn shift_tab_goes_back_and_clamps_at_first() {
        let (mut manager, mut surface) = active_on(SurfaceKind::MultiLine);
        manager.handle_key(&mut surface, &KeyEvent::new(Key::Tab));
        let back = KeyEvent::shifted(Key::Tab);

        assert_eq!(manager.handle_key(&mut surface, &back), KeyDisposition::Consumed);
        assert_eq!(manager.handle_key(&mut surface, &back), KeyDisposition::Consumed);

        assert_eq!(manager.state().map(TabStopState::current_index), Some(0));
        assert_eq!(surface.selections, vec![(7, 11), (16, 21), (7, 11), (7, 11)]);
    }

    #[test]
    fn escape_deactivates_and_passes_through() {
        let (mut manager, mut surface) = active_on(SurfaceKind::Contenteditable);
        let disposition = manager.handle_key(&mut surface, &KeyEvent::new(Key::Escape));
        assert_eq!(disposition, KeyDisposition::PassThrough);
        assert!(!manager.is_active());
        assert_eq!(surface.selections.len(), 1);
    }

    #[test]
    fn enter_confirms_single_line_only() {
        let enter = KeyEvent::new(Key::Enter);

        let (mut manager, mut surface) = active_on(SurfaceKind::SingleLine);
        assert_eq!(manager.handle_key(&mut surface, &enter), KeyDisposition::Consumed);
        assert!(!manager.is_active());

        for kind in [SurfaceKind::MultiLine, SurfaceKind::Contenteditable] {
            let (mut manager, mut surface) = active_on(kind);
            assert_eq!(manager.handle_key(&mut surface, &enter), KeyDisposition::PassThrough);
            assert!(manager.is_active());
        }
    }

    #[test]
    fn other_keys_and_other_surfaces_pass_through() {
        let (mut manager, mut surface) = active_on(SurfaceKind::MultiLine);
        let mut stranger = FakeSurface::new(SurfaceKind::MultiLine, "");

        assert_eq!(
            manager.handle_key(&mut surface, &KeyEvent::new(Key::Char('x'))),
            KeyDisposition::PassThrough
        );
        assert_eq!(
            manager.handle_key(&mut stranger, &KeyEvent::new(Key::Tab)),
            KeyDisposition::PassThrough
        );
        assert!(manager.is_active());
        assert!(stranger.selections.is_empty());
    }

    #[test]
    fn blur_deactivates_only_after_debounce_and_without_focus() {
        let (mut manager, mut surface) = active_on(SurfaceKind::MultiLine);
        let start = Instant::now();
        surface.focused = false;
        manager.handle_blur(start);

        manager.poll(&surface, start + Duration::from_millis(50));
        assert!(manager.is_active());

        manager.poll(&surface, start + BLUR_DEBOUNCE);
        assert!(!manager.is_active());
    }

    #[test]
    fn transient_blur_is_forgotten() {
        let (mut manager, surface) = active_on(SurfaceKind::MultiLine);
        let start = Instant::now();
        manager.handle_blur(start);

        manager.poll(&surface, start + Duration::from_millis(150));
        assert!(manager.is_active());
        assert!(manager.state().is_some_and(|s| s.pending_blur.is_none()));
    }

    #[test]
    fn reactivation_replaces_previous_session() {
        let (mut manager, mut first) = active_on(SurfaceKind::MultiLine);
        let mut second = FakeSurface::new(SurfaceKind::SingleLine, "abc");

        manager.activate(&mut second, vec![stop(1, 0, 1)], 0);

        assert!(!first.events().has_listener(EventKind::KeyDown));
        assert!(second.events().has_listener(EventKind::KeyDown));
        assert_eq!(manager.state().map(TabStopState::surface), Some(second.id()));
        assert_eq!(
            manager.handle_key(&mut first, &KeyEvent::new(Key::Tab)),
            KeyDisposition::PassThrough
        );
    }

    #[test]
    fn deactivate_is_idempotent() {
        let (mut manager, _surface) = active_on(SurfaceKind::MultiLine);
        manager.deactivate();
        manager.deactivate();
        assert!(!manager.is_active());
        assert_eq!(manager.current_stop(), None);
    }
}
