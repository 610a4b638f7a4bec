//! Project-scoped identity allocator
//!
//! Pure bookkeeping: the generator maps local ids of one project to item
//! handles and never applies access policy. It is generic over the handle type
//! so the component layer can register whatever arena handle it uses.

use crate::errors::{Result, SimError};
use crate::identifiers::{Identifier, ProjectHandle};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Issues, reserves and releases identifiers for one project
///
/// At any instant at most one live item maps to a given local id, and a
/// released local id is never registered again.
#[derive(Debug, Clone)]
pub struct IdGenerator<H> {
    location: ProjectHandle,
    global_id: Uuid,
    last_local_id: u64,
    items: HashMap<u64, H>,
    released: HashSet<u64>,
    loading: bool,
}

impl<H> IdGenerator<H>
where
    H: Copy + Eq + fmt::Debug,
{
    /// Create an empty generator for the project `location` with guid `global_id`
    pub fn new(location: ProjectHandle, global_id: Uuid) -> Self {
        Self {
            location,
            global_id,
            last_local_id: 0,
            items: HashMap::new(),
            released: HashSet::new(),
            loading: false,
        }
    }

    /// Project handle stamped into every issued identifier
    pub fn location(&self) -> ProjectHandle {
        self.location
    }

    /// Persistent guid of the project
    pub fn global_id(&self) -> Uuid {
        self.global_id
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no identifier is registered
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `id` names a local id of this project that was released
    pub fn is_released(&self, id: &Identifier) -> bool {
        id.global_id() == self.global_id && self.released.contains(&id.local_id())
    }

    /// Whether bulk loading mode is active
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Enter bulk loading mode, during which pre-assigned ids may be reserved
    pub fn start_loading(&mut self) {
        self.loading = true;
    }

    /// Leave bulk loading mode
    pub fn end_loading(&mut self) {
        self.loading = false;
    }

    /// Issue a fresh identifier for `item`
    pub fn next_id(&mut self, item: H) -> Identifier {
        self.last_local_id += 1;
        while self.items.contains_key(&self.last_local_id)
            || self.released.contains(&self.last_local_id)
        {
            self.last_local_id += 1;
        }
        self.items.insert(self.last_local_id, item);
        tracing::trace!(local_id = self.last_local_id, ?item, "issued identifier");
        Identifier::new(self.location, self.global_id, self.last_local_id)
    }

    /// Validate that `item` may claim `id` without changing any state
    pub fn check_reserve(&self, item: H, id: &Identifier) -> Result<()> {
        if !self.loading {
            return Err(SimError::unsupported(format!(
                "identifier {id} is already assigned; reusing identifiers is only allowed while loading"
            )));
        }
        if id.global_id() != self.global_id || id.location().is_some_and(|l| l != self.location) {
            return Err(SimError::unsupported(format!(
                "identifier {id} belongs to another project"
            )));
        }
        if id.local_id() == 0 {
            return Err(SimError::invalid_argument("cannot reserve the empty identifier"));
        }
        if self.released.contains(&id.local_id()) {
            return Err(SimError::unsupported(format!(
                "identifier {id} was released and cannot be claimed again"
            )));
        }
        match self.items.get(&id.local_id()) {
            Some(existing) if *existing != item => Err(SimError::duplicate(format!(
                "identifier {id} is already held by {existing:?}"
            ))),
            _ => Ok(()),
        }
    }

    /// Claim a pre-existing identifier for `item` (loading mode only)
    ///
    /// Returns the identifier located in this project.
    pub fn reserve(&mut self, item: H, id: &Identifier) -> Result<Identifier> {
        self.check_reserve(item, id)?;
        self.items.insert(id.local_id(), item);
        self.last_local_id = self.last_local_id.max(id.local_id());
        tracing::trace!(local_id = id.local_id(), ?item, "reserved identifier");
        Ok(id.located_in(self.location))
    }

    /// Release the registration behind `id`
    ///
    /// The caller keeps the numeric id on the item and clears its location.
    pub fn remove(&mut self, id: &Identifier) -> Option<H> {
        if id.location() != Some(self.location) {
            return None;
        }
        let removed = self.items.remove(&id.local_id());
        if removed.is_some() {
            self.released.insert(id.local_id());
            tracing::trace!(local_id = id.local_id(), "released identifier");
        }
        removed
    }

    /// Item registered under a located identifier of this project
    pub fn get(&self, id: &Identifier) -> Option<H> {
        if id.location() != Some(self.location) || id.global_id() != self.global_id {
            return None;
        }
        self.items.get(&id.local_id()).copied()
    }

    /// Item registered under the numeric parts of `id`, ignoring its location
    ///
    /// Used to resolve forward references read before their target was loaded.
    /// Released ids never resolve.
    pub fn resolve(&self, id: &Identifier) -> Option<H> {
        if id.global_id() != self.global_id || self.released.contains(&id.local_id()) {
            return None;
        }
        self.items.get(&id.local_id()).copied()
    }

    /// Whether `id` is registered to exactly `item`
    pub fn is_registered_to(&self, id: &Identifier, item: H) -> bool {
        self.get(id) == Some(item)
    }
}
