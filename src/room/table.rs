//! Insertion-ordered id table
//!
//! Keeps room members and streams in the order they were first added, so
//! fan-out and replay visit them deterministically.

use std::collections::HashMap;

/// Map from string id to value that iterates in first-insertion order
///
/// Values live in a slot vector indexed by id. Removal leaves an empty slot
/// behind; slots are compacted once more than half of them are empty.
/// Re-inserting an existing id replaces the value in place and keeps its
/// original position.
#[derive(Debug, Clone)]
pub(super) struct OrderedTable<V> {
    index: HashMap<String, usize>,
    slots: Vec<Option<(String, V)>>,
}

impl<V> OrderedTable<V> {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace, returning the previous value
    pub(super) fn insert(&mut self, id: &str, value: V) -> Option<V> {
        if let Some(slot) = self.index.get(id).and_then(|&i| self.slots.get_mut(i)) {
            return slot.replace((id.to_owned(), value)).map(|(_, v)| v);
        }

        self.index.insert(id.to_owned(), self.slots.len());
        self.slots.push(Some((id.to_owned(), value)));
        None
    }

    pub(super) fn remove(&mut self, id: &str) -> Option<V> {
        let slot = self.index.remove(id)?;
        let (_, value) = self.slots.get_mut(slot)?.take()?;

        if self.slots.len() > 2 * self.index.len() + 8 {
            self.compact();
        }

        Some(value)
    }

    pub(super) fn get(&self, id: &str) -> Option<&V> {
        let slot = *self.index.get(id)?;
        self.slots.get(slot)?.as_ref().map(|(_, v)| v)
    }

    pub(super) fn len(&self) -> usize {
        self.index.len()
    }

    pub(super) fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.iter().filter_map(|s| s.as_ref().map(|(_, v)| v))
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);

        for (i, slot) in self.slots.iter().enumerate() {
            if let Some((id, _)) = slot {
                if let Some(pos) = self.index.get_mut(id) {
                    *pos = i;
                }
            }
        }
    }
}
