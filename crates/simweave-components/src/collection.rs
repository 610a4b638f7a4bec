//! Managed collections and change tracking
//!
//! A [`ManagedCollection`] is the ordered storage behind every owning
//! collection of a project. It only holds keys; wiring, identity and access
//! checks are done by the project before anything here is touched, so every
//! mutator in this module is infallible.

use simweave_core::{Timestamp, EPOCH_MIN};

/// Change flag and timestamp of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeTracker {
    has_changes: bool,
    last_change: Timestamp,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self {
            has_changes: false,
            last_change: EPOCH_MIN,
        }
    }
}

impl ChangeTracker {
    /// Whether a mutation was committed since the last reset
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Time of the last committed mutation
    pub fn last_change(&self) -> Timestamp {
        self.last_change
    }

    pub(crate) fn record(&mut self, at: Timestamp) {
        self.has_changes = true;
        self.last_change = at;
    }

    pub(crate) fn reset(&mut self) {
        self.has_changes = false;
    }
}

/// Ordered keys of one owning collection
#[derive(Debug, Clone)]
pub struct ManagedCollection<K> {
    items: Vec<K>,
    changes: ChangeTracker,
}

impl<K> Default for ManagedCollection<K> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            changes: ChangeTracker::default(),
        }
    }
}

impl<K: Copy + Eq> ManagedCollection<K> {
    /// Keys in collection order
    pub fn items(&self) -> &[K] {
        &self.items
    }

    /// Iterate keys in collection order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.items.iter().copied()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the collection holds nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `key` is part of the collection
    pub fn contains(&self, key: K) -> bool {
        self.items.contains(&key)
    }

    /// Index of `key`
    pub fn position(&self, key: K) -> Option<usize> {
        self.items.iter().position(|k| *k == key)
    }

    /// Key at `index`
    pub fn get(&self, index: usize) -> Option<K> {
        self.items.get(index).copied()
    }

    /// Change state of the collection
    pub fn changes(&self) -> &ChangeTracker {
        &self.changes
    }

    /// Shorthand for `changes().has_changes()`
    pub fn has_changes(&self) -> bool {
        self.changes.has_changes
    }

    /// Shorthand for `changes().last_change()`
    pub fn last_change(&self) -> Timestamp {
        self.changes.last_change
    }

    pub(crate) fn push(&mut self, key: K) {
        self.items.push(key);
    }

    pub(crate) fn insert(&mut self, index: usize, key: K) {
        let index = index.min(self.items.len());
        self.items.insert(index, key);
    }

    pub(crate) fn remove(&mut self, key: K) -> Option<usize> {
        let index = self.position(key)?;
        self.items.remove(index);
        Some(index)
    }

    pub(crate) fn replace(&mut self, index: usize, key: K) -> Option<K> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, key))
    }

    pub(crate) fn take_all(&mut self) -> Vec<K> {
        std::mem::take(&mut self.items)
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simweave_core::test_utils::ts;

    #[test]
    fn tracker_records_and_resets() {
        let mut collection: ManagedCollection<u32> = ManagedCollection::default();
        assert!(!collection.has_changes());
        assert_eq!(collection.last_change(), EPOCH_MIN);

        collection.push(1);
        collection.tracker_mut().record(ts(3));
        assert!(collection.has_changes());
        assert_eq!(collection.last_change(), ts(3));

        collection.tracker_mut().reset();
        assert!(!collection.has_changes());
        assert_eq!(collection.last_change(), ts(3));
    }

    #[test]
    fn replace_and_remove_keep_order() {
        let mut collection: ManagedCollection<u32> = ManagedCollection::default();
        for key in [1, 2, 3] {
            collection.push(key);
        }
        assert_eq!(collection.replace(1, 9), Some(2));
        assert_eq!(collection.items(), &[1, 9, 3]);
        assert_eq!(collection.remove(1), Some(0));
        assert_eq!(collection.remove(1), None);
        collection.insert(5, 4);
        assert_eq!(collection.items(), &[9, 3, 4]);
        assert_eq!(collection.take_all(), vec![9, 3, 4]);
        assert!(collection.is_empty());
    }
}
