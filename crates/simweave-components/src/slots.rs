//! Child slot addressing
//!
//! Children of a component are addressed by a [`Slot`]: a taxonomy key
//! ([`SlotBase`]) plus a free-form extension. Entries may be declared without a
//! component; filling one requires the component's current slot to match the
//! entry's base.

use crate::object::ComponentKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque taxonomy key, compared by equality only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotBase(String);

impl SlotBase {
    /// Wrap a taxonomy key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The taxonomy key
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a child entry within its parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    base: SlotBase,
    extension: String,
}

impl Slot {
    /// Slot `base` with `extension`
    pub fn new(base: SlotBase, extension: impl Into<String>) -> Self {
        Self {
            base,
            extension: extension.into(),
        }
    }

    /// Taxonomy key
    pub fn base(&self) -> &SlotBase {
        &self.base
    }

    /// Extension distinguishing entries with the same base
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Same extension, different base
    pub fn with_base(&self, base: SlotBase) -> Self {
        Self {
            base,
            extension: self.extension.clone(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extension.is_empty() {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{} {}", self.base, self.extension)
        }
    }
}

/// Vocabulary of slot keys
///
/// The project only needs key resolution and the default slot; where the
/// vocabulary comes from is up to the embedding application.
pub trait SlotTaxonomy {
    /// Resolve `key` to a slot base, `None` if the vocabulary lacks it
    fn resolve(&self, key: &str) -> Option<SlotBase>;

    /// Slot assigned to components created without one
    fn default_slot(&self) -> SlotBase;
}

/// Fixed in-memory taxonomy
#[derive(Debug, Clone)]
pub struct StaticTaxonomy {
    keys: BTreeSet<String>,
    default: SlotBase,
}

impl StaticTaxonomy {
    /// Taxonomy holding only `default`
    pub fn new(default: impl Into<String>) -> Self {
        let default = default.into();
        let mut keys = BTreeSet::new();
        keys.insert(default.clone());
        Self {
            keys,
            default: SlotBase(default),
        }
    }

    /// Add `keys` to the vocabulary
    pub fn with_slots<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Number of known keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false, the default slot is part of the vocabulary
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SlotTaxonomy for StaticTaxonomy {
    fn resolve(&self, key: &str) -> Option<SlotBase> {
        self.keys.get(key).map(|k| SlotBase::new(k.clone()))
    }

    fn default_slot(&self) -> SlotBase {
        self.default.clone()
    }
}

/// One addressable child position of a component
#[derive(Debug, Clone)]
pub struct ChildSlotEntry {
    pub(crate) slot: Slot,
    pub(crate) parent: Option<ComponentKey>,
    pub(crate) component: Option<ComponentKey>,
}

impl ChildSlotEntry {
    pub(crate) fn new(slot: Slot, parent: ComponentKey, component: Option<ComponentKey>) -> Self {
        Self {
            slot,
            parent: Some(parent),
            component,
        }
    }

    /// Address of the entry
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// Component owning the entry; `None` once the entry was removed
    pub fn parent(&self) -> Option<ComponentKey> {
        self.parent
    }

    /// Component filling the entry
    pub fn component(&self) -> Option<ComponentKey> {
        self.component
    }

    /// True if no component fills the entry
    pub fn is_unfilled(&self) -> bool {
        self.component.is_none()
    }
}
