//! Ordered source registry keyed by stable IDs.

use crate::source::{SourceId, SourceIdAllocator};

/// Sources of one mixer in registration order.
///
/// Only ever touched under the mixer lock, so it needs no synchronization
/// of its own.
#[derive(Debug)]
pub(crate) struct Registry<T> {
    ids: SourceIdAllocator,
    entries: Vec<(SourceId, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            ids: SourceIdAllocator::default(),
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    /// Appends an entry and returns its freshly allocated ID.
    pub fn insert(&mut self, entry: T) -> SourceId {
        let id = self.ids.next_id();
        self.entries.push((id, entry));
        id
    }

    /// Unlinks an entry, preserving the order of the rest.
    pub fn remove(&mut self, id: SourceId) -> Option<T> {
        let idx = self.entries.iter().position(|(i, _)| *i == id)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, id: SourceId) -> Option<&T> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &T)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SourceId, &mut T)> {
        self.entries.iter_mut().map(|(id, e)| (*id, e))
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }
}
