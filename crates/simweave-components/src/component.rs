//! Component nodes
//!
//! A [`ComponentNode`] is the unit of ownership and permission. It is built
//! detached, becomes identified and owned when a managed collection accepts
//! it, and keeps its sub-collections as key lists into the project arenas.
//! Every link pointing upwards (parent, container, factory) is a plain key.

use crate::collection::ManagedCollection;
use crate::object::{CalculationKey, CollectionRef, ComponentKey, EntryKey, InstanceKey};
use crate::object::{ParameterKey, ReferenceKey};
use crate::slots::SlotBase;
use simweave_core::{AccessProfile, Identifier, SimUserRole};

/// One component of the project tree
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub(crate) id: Identifier,
    pub(crate) name: String,
    pub(crate) current_slot: SlotBase,
    pub(crate) parent: Option<ComponentKey>,
    pub(crate) parent_container: Option<EntryKey>,
    pub(crate) factory: Option<CollectionRef>,
    pub(crate) access: AccessProfile,
    pub(crate) children: ManagedCollection<EntryKey>,
    pub(crate) parameters: ManagedCollection<ParameterKey>,
    pub(crate) calculations: ManagedCollection<CalculationKey>,
    pub(crate) instances: ManagedCollection<InstanceKey>,
    pub(crate) references: ManagedCollection<ReferenceKey>,
    pub(crate) referenced_by: Vec<ReferenceKey>,
}

impl ComponentNode {
    /// Detached component created by `creator` in `slot`
    pub fn new(name: impl Into<String>, creator: SimUserRole, slot: SlotBase) -> Self {
        Self {
            id: Identifier::EMPTY,
            name: name.into(),
            current_slot: slot,
            parent: None,
            parent_container: None,
            factory: None,
            access: AccessProfile::new(creator),
            children: ManagedCollection::default(),
            parameters: ManagedCollection::default(),
            calculations: ManagedCollection::default(),
            instances: ManagedCollection::default(),
            references: ManagedCollection::default(),
            referenced_by: Vec::new(),
        }
    }

    /// Pre-assigned identifier, reserved when the component is inserted while loading
    pub fn with_identifier(mut self, id: Identifier) -> Self {
        self.id = id;
        self
    }

    /// Replace the access profile, used when restoring loaded components
    pub fn with_access_profile(mut self, access: AccessProfile) -> Self {
        self.access = access;
        self
    }

    /// Identifier, empty until the component is first inserted
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Taxonomy slot the component currently fills
    pub fn current_slot(&self) -> &SlotBase {
        &self.current_slot
    }

    /// Parent component, `None` for root and detached components
    pub fn parent(&self) -> Option<ComponentKey> {
        self.parent
    }

    /// Child entry of the parent holding this component
    pub fn parent_container(&self) -> Option<EntryKey> {
        self.parent_container
    }

    /// Collection owning this component, `None` while detached
    pub fn factory(&self) -> Option<CollectionRef> {
        self.factory
    }

    /// True while a collection owns the component
    pub fn is_attached(&self) -> bool {
        self.factory.is_some()
    }

    /// Per-role privileges and audit stamps
    pub fn access_profile(&self) -> &AccessProfile {
        &self.access
    }

    /// Child slot entries
    pub fn children(&self) -> &ManagedCollection<EntryKey> {
        &self.children
    }

    /// Owned parameters
    pub fn parameters(&self) -> &ManagedCollection<ParameterKey> {
        &self.parameters
    }

    /// Owned calculations
    pub fn calculations(&self) -> &ManagedCollection<CalculationKey> {
        &self.calculations
    }

    /// Owned instances
    pub fn instances(&self) -> &ManagedCollection<InstanceKey> {
        &self.instances
    }

    /// Outbound references owned by this component
    pub fn referenced_components(&self) -> &ManagedCollection<ReferenceKey> {
        &self.references
    }

    /// Owned references elsewhere whose target is this component
    pub fn referenced_by(&self) -> &[ReferenceKey] {
        &self.referenced_by
    }

    pub(crate) fn detach(&mut self) {
        self.parent = None;
        self.parent_container = None;
        self.factory = None;
    }
}
