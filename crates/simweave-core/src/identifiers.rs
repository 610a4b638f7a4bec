//! Identifier types used across the component model
//!
//! An [`Identifier`] names one live object inside one project. The project is
//! referenced through a [`ProjectHandle`] (the identifier's *location*) and by
//! its persistent guid. When an object is deleted its identifier keeps the
//! numeric parts but loses the location, so stale references can notice that
//! the object is gone without the id ever being handed out again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_PROJECT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Runtime handle of a loaded project
///
/// Handles are unique within the process and never reused, which allows
/// several independent projects to live side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectHandle(u64);

impl ProjectHandle {
    /// Allocate a fresh, process-unique handle
    pub fn allocate() -> Self {
        Self(NEXT_PROJECT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw handle value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project-{}", self.0)
    }
}

/// Project-scoped identifier of a component, parameter, calculation or instance
///
/// The location is runtime state and is not serialized; loaders re-attach
/// identifiers to a project through the identity allocator's loading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(skip)]
    location: Option<ProjectHandle>,
    local_id: u64,
    global_id: Uuid,
}

impl Identifier {
    /// The empty identifier carried by detached objects
    pub const EMPTY: Identifier = Identifier {
        location: None,
        local_id: 0,
        global_id: Uuid::nil(),
    };

    /// Create an identifier located in a project
    pub fn new(location: ProjectHandle, global_id: Uuid, local_id: u64) -> Self {
        Self {
            location: Some(location),
            local_id,
            global_id,
        }
    }

    /// Create an identifier that has not been attached to a project yet
    ///
    /// Used by loaders that read ids before the owning project is known.
    pub fn unlocated(global_id: Uuid, local_id: u64) -> Self {
        Self {
            location: None,
            local_id,
            global_id,
        }
    }

    /// The project this identifier is registered in, if any
    pub fn location(&self) -> Option<ProjectHandle> {
        self.location
    }

    /// Numeric id, unique within the location
    pub fn local_id(&self) -> u64 {
        self.local_id
    }

    /// Persistent guid of the owning project
    pub fn global_id(&self) -> Uuid {
        self.global_id
    }

    /// True for the identifier of an object that never received an id
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.local_id == 0
    }

    /// True while the identifier names a live object of its location
    pub fn is_located(&self) -> bool {
        self.location.is_some()
    }

    /// Same numeric identity, ignoring the location
    pub fn same_id(&self, other: &Identifier) -> bool {
        self.local_id == other.local_id && self.global_id == other.global_id
    }

    /// Copy of this identifier attached to `location`
    pub fn located_in(self, location: ProjectHandle) -> Self {
        Self {
            location: Some(location),
            ..self
        }
    }

    /// Copy of this identifier with the location cleared and the numbers kept
    pub fn released(self) -> Self {
        Self {
            location: None,
            ..self
        }
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}:{}@{}", self.global_id, self.local_id, location),
            None => write!(f, "{}:{}", self.global_id, self.local_id),
        }
    }
}
