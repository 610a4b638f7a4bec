//! Typed arena storage
//!
//! Every object of a project lives in an [`Arena`] and is addressed by a typed
//! [`Key`]. Keys are never reused, so a key held after its object was disposed
//! simply stops resolving. Back references (parent, container, owner) are keys
//! and never keep anything alive.

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle of an object stored in an [`Arena<T>`]
pub struct Key<T> {
    raw: u64,
    marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            marker: PhantomData,
        }
    }

    /// Raw key value, unique within the arena
    pub fn raw(&self) -> u64 {
        self.raw
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Key<T> {}

impl<T> PartialOrd for Key<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Key<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{short}#{}", self.raw)
    }
}

/// Insertion-ordered storage with never-reused keys
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: IndexMap<u64, T>,
    next: u64,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            next: 1,
        }
    }
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its key
    pub fn insert(&mut self, value: T) -> Key<T> {
        let raw = self.next;
        self.next += 1;
        self.items.insert(raw, value);
        Key::from_raw(raw)
    }

    /// Shared access to the value behind `key`
    pub fn get(&self, key: Key<T>) -> Option<&T> {
        self.items.get(&key.raw)
    }

    /// Exclusive access to the value behind `key`
    pub fn get_mut(&mut self, key: Key<T>) -> Option<&mut T> {
        self.items.get_mut(&key.raw)
    }

    /// Whether `key` resolves
    pub fn contains(&self, key: Key<T>) -> bool {
        self.items.contains_key(&key.raw)
    }

    /// Drop the value behind `key`
    pub fn remove(&mut self, key: Key<T>) -> Option<T> {
        self.items.shift_remove(&key.raw)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = Key<T>> + '_ {
        self.items.keys().map(|raw| Key::from_raw(*raw))
    }

    /// All entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Key<T>, &T)> {
        self.items.iter().map(|(raw, value)| (Key::from_raw(*raw), value))
    }
}
