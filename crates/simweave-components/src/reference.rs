//! Non-owning component references
//!
//! A reference is owned by one component and points at another by identifier.
//! While owned and resolved, the target lists the reference in its
//! `referenced_by`. The target's profile is never consulted.

use crate::collection::ManagedCollection;
use crate::component::ComponentNode;
use crate::items::{Identified, OwnedItem, Sealed};
use crate::object::{CollectionKind, ComponentKey, ObjectRef};
use crate::project::Project;
use crate::slots::Slot;
use crate::store::{Arena, Key};
use simweave_core::Identifier;

/// Link from an owning component to a target component
#[derive(Debug, Clone)]
pub struct ComponentReference {
    pub(crate) owner: Option<ComponentKey>,
    pub(crate) target: Option<ComponentKey>,
    pub(crate) target_id: Identifier,
    pub(crate) slot: Slot,
}

impl ComponentReference {
    /// Unresolved reference to the component identified by `target_id`
    ///
    /// The target is bound once the reference is owned and the identifier
    /// resolves, at the latest when loading ends.
    pub fn to_identifier(slot: Slot, target_id: Identifier) -> Self {
        Self {
            owner: None,
            target: None,
            target_id,
            slot,
        }
    }

    /// Reference without a target
    pub fn unset(slot: Slot) -> Self {
        Self::to_identifier(slot, Identifier::EMPTY)
    }

    /// Component owning the reference
    pub fn owner(&self) -> Option<ComponentKey> {
        self.owner
    }

    /// Bound target component
    pub fn target(&self) -> Option<ComponentKey> {
        self.target
    }

    /// Identifier of the target, kept after the target was deleted
    pub fn target_id(&self) -> &Identifier {
        &self.target_id
    }

    /// Slot the target fills from the owner's point of view
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// True if a target is bound
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

impl Sealed for ComponentReference {}

impl Identified for ComponentReference {
    fn from_object(object: ObjectRef) -> Option<Key<Self>> {
        match object {
            ObjectRef::Reference(key) => Some(key),
            _ => None,
        }
    }
}

impl OwnedItem for ComponentReference {
    const KIND: CollectionKind = CollectionKind::References;
    const IDENTIFIED: bool = false;

    fn identifier(&self) -> Identifier {
        Identifier::EMPTY
    }

    fn owner(&self) -> Option<ComponentKey> {
        self.owner
    }

    fn object(key: Key<Self>) -> ObjectRef {
        ObjectRef::Reference(key)
    }

    fn set_identifier(&mut self, _id: Identifier) {}

    fn set_owner(&mut self, owner: Option<ComponentKey>) {
        self.owner = owner;
    }

    fn arena(project: &Project) -> &Arena<Self> {
        &project.references
    }

    fn arena_mut(project: &mut Project) -> &mut Arena<Self> {
        &mut project.references
    }

    fn collection(node: &ComponentNode) -> &ManagedCollection<Key<Self>> {
        &node.references
    }

    fn collection_mut(node: &mut ComponentNode) -> &mut ManagedCollection<Key<Self>> {
        &mut node.references
    }
}
