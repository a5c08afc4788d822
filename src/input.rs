//! Platform-agnostic keyboard input
//!
//! Defines key types and a small listener hub that does not depend on any GUI
//! library. Platform adapters translate native key events into [`KeyEvent`]s
//! and feed them to [`Keyboard::dispatch`].
//!
//! Listeners are channel endpoints rather than callbacks: a subscriber keeps
//! the [`flume::Receiver`] returned by [`Keyboard::add_listener`] and drains
//! it whenever it is pumped. Removing the listener drops the sender, so no
//! further events are delivered.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

/// Keyboard key enumeration (platform-agnostic)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    // Letter keys
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Control keys
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

bitflags! {
    /// Modifier keys held while a key event fired.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const CTRL  = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT   = 1 << 2;
        const META  = 1 << 3;
    }
}

/// A key-down event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Key pressed with no modifiers.
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    /// Key pressed with `Ctrl` held.
    #[must_use]
    pub const fn ctrl(key: Key) -> Self {
        Self::new(key, Modifiers::CTRL)
    }
}

new_key_type! {
    pub struct ListenerKey;
}

/// Key-down listener hub (the window-level event target).
#[derive(Debug, Default)]
pub struct Keyboard {
    listeners: SlotMap<ListenerKey, flume::Sender<KeyEvent>>,
}

impl Keyboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its key plus the receiving end.
    pub fn add_listener(&mut self) -> (ListenerKey, flume::Receiver<KeyEvent>) {
        let (tx, rx) = flume::unbounded();
        let key = self.listeners.insert(tx);
        log::debug!("Key listener {key:?} registered");
        (key, rx)
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&mut self, key: ListenerKey) -> bool {
        let removed = self.listeners.remove(key).is_some();
        if removed {
            log::debug!("Key listener {key:?} removed");
        }
        removed
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: ListenerKey) -> bool {
        self.listeners.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Delivers an event to every registered listener.
    ///
    /// Listeners whose receiver has been dropped are pruned. Returns the
    /// number of listeners that received the event.
    pub fn dispatch(&mut self, event: KeyEvent) -> usize {
        let mut delivered = 0;
        self.listeners.retain(|key, tx| {
            if tx.send(event).is_ok() {
                delivered += 1;
                true
            } else {
                log::debug!("Pruning disconnected key listener {key:?}");
                false
            }
        });
        delivered
    }
}
