//! Per-surface listener registry and keyboard event types.
//!
//! Subscribing returns a [`Subscription`] that unregisters itself on drop, so
//! whoever holds it controls how long the listener lives.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    KeyDown,
    Blur,
}

type Callback = Box<dyn FnMut(EventKind)>;

struct Listener {
    id: u64,
    kind: EventKind,
    callback: Option<Callback>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Listener registry shared between a surface and its subscriptions.
#[derive(Default)]
pub struct EventTarget {
    registry: Rc<RefCell<Registry>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `kind`.
    pub fn listen(&self, kind: EventKind, callback: impl FnMut(EventKind) + 'static) -> Subscription {
        self.register(kind, Some(Box::new(callback)))
    }

    /// Claims `kind` events without a callback; the host routes them to the
    /// holder while the subscription is alive.
    pub fn capture(&self, kind: EventKind) -> Subscription {
        self.register(kind, None)
    }

    fn register(&self, kind: EventKind, callback: Option<Callback>) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push(Listener { id, kind, callback });
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Notifies every listener of `kind`, returning how many were registered.
    ///
    /// Callbacks run without the registry borrowed, so they may subscribe or
    /// drop subscriptions themselves.
    pub fn dispatch(&self, kind: EventKind) -> usize {
        let ids: Vec<u64> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| listener.id)
            .collect();

        for &id in &ids {
            let callback = self.take_callback(id);
            if let Some(mut callback) = callback {
                callback(kind);
                self.restore_callback(id, callback);
            }
        }
        ids.len()
    }

    fn take_callback(&self, id: u64) -> Option<Callback> {
        let mut registry = self.registry.borrow_mut();
        registry
            .listeners
            .iter_mut()
            .find(|listener| listener.id == id)
            .and_then(|listener| listener.callback.take())
    }

    fn restore_callback(&self, id: u64, callback: Callback) {
        let mut registry = self.registry.borrow_mut();
        if let Some(listener) = registry.listeners.iter_mut().find(|l| l.id == id) {
            listener.callback = Some(callback);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.kind == kind)
            .count()
    }

    pub fn has_listener(&self, kind: EventKind) -> bool {
        self.listener_count(kind) > 0
    }
}

/// Keeps a listener registered until dropped.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .listeners
                .retain(|listener| listener.id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Escape,
    Backspace,
    Char(char),
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
        }
    }

    pub fn shifted(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::new(key)
        }
    }
}

/// Whether a key handler used the key or left it for the default action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    PassThrough,
}
