//! Character ↔ attachable membership index
//!
//! Replaces a mutable "attachables" list hanging off each character with two
//! one-directional lookups owned in one place:
//! - character id → set of attachable ids
//! - attachable id → character id
//!
//! Registration is idempotent: the same (character, attachable) pair can be
//! registered any number of times and still appears once.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::store::ObjectId;

#[derive(Debug, Default, Clone)]
pub struct AttachmentRegistry {
    by_character: FxHashMap<ObjectId, FxHashSet<ObjectId>>,
    by_attachable: FxHashMap<ObjectId, ObjectId>,
}

impl AttachmentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `attachable` as riding on `character`.
    ///
    /// An attachable belongs to at most one character; registering it under a
    /// new one moves it. Returns `false` if the pair was already registered.
    pub fn register(&mut self, character: &ObjectId, attachable: &ObjectId) -> bool {
        match self.by_attachable.get(attachable) {
            Some(current) if current == character => return false,
            Some(_) => {
                self.unregister(attachable);
            }
            None => {}
        }

        self.by_character
            .entry(character.clone())
            .or_default()
            .insert(attachable.clone());
        self.by_attachable.insert(attachable.clone(), character.clone());
        true
    }

    /// Removes `attachable` from whichever character holds it.
    ///
    /// Returns the character it was registered under, if any.
    pub fn unregister(&mut self, attachable: &ObjectId) -> Option<ObjectId> {
        let character = self.by_attachable.remove(attachable)?;
        if let Some(set) = self.by_character.get_mut(&character) {
            set.remove(attachable);
            if set.is_empty() {
                self.by_character.remove(&character);
            }
        }
        Some(character)
    }

    /// Attachables riding on `character`, in no particular order.
    pub fn attachables_of(&self, character: &ObjectId) -> impl Iterator<Item = &ObjectId> + '_ {
        self.by_character
            .get(character)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    #[must_use]
    pub fn attachable_count(&self, character: &ObjectId) -> usize {
        self.attachables_of(character).count()
    }

    #[must_use]
    pub fn character_of(&self, attachable: &ObjectId) -> Option<&ObjectId> {
        self.by_attachable.get(attachable)
    }

    #[must_use]
    pub fn contains(&self, character: &ObjectId, attachable: &ObjectId) -> bool {
        self.by_character
            .get(character)
            .is_some_and(|set| set.contains(attachable))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_attachable.is_empty()
    }
}
