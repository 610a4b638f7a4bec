//! Object and collection handles
//!
//! [`ObjectRef`] addresses any identified object of a project, [`CollectionRef`]
//! any managed collection. Both are plain copyable values used in
//! notifications and in the identity allocator.

use crate::component::ComponentNode;
use crate::items::{Calculation, Instance, Parameter};
use crate::reference::ComponentReference;
use crate::slots::ChildSlotEntry;
use crate::store::Key;
use std::fmt;

/// Handle of a component
pub type ComponentKey = Key<ComponentNode>;
/// Handle of a child slot entry
pub type EntryKey = Key<ChildSlotEntry>;
/// Handle of a parameter
pub type ParameterKey = Key<Parameter>;
/// Handle of a calculation
pub type CalculationKey = Key<Calculation>;
/// Handle of a geometric or network instance
pub type InstanceKey = Key<Instance>;
/// Handle of a component reference
pub type ReferenceKey = Key<ComponentReference>;

/// Any object stored in a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// A component
    Component(ComponentKey),
    /// A child slot entry
    ChildEntry(EntryKey),
    /// A parameter
    Parameter(ParameterKey),
    /// A calculation
    Calculation(CalculationKey),
    /// An instance
    Instance(InstanceKey),
    /// A component reference
    Reference(ReferenceKey),
}

impl ObjectRef {
    /// The component behind this handle, if it is one
    pub fn as_component(&self) -> Option<ComponentKey> {
        match self {
            Self::Component(key) => Some(*key),
            _ => None,
        }
    }
}

impl From<ComponentKey> for ObjectRef {
    fn from(key: ComponentKey) -> Self {
        Self::Component(key)
    }
}

impl From<EntryKey> for ObjectRef {
    fn from(key: EntryKey) -> Self {
        Self::ChildEntry(key)
    }
}

impl From<ParameterKey> for ObjectRef {
    fn from(key: ParameterKey) -> Self {
        Self::Parameter(key)
    }
}

impl From<CalculationKey> for ObjectRef {
    fn from(key: CalculationKey) -> Self {
        Self::Calculation(key)
    }
}

impl From<InstanceKey> for ObjectRef {
    fn from(key: InstanceKey) -> Self {
        Self::Instance(key)
    }
}

impl From<ReferenceKey> for ObjectRef {
    fn from(key: ReferenceKey) -> Self {
        Self::Reference(key)
    }
}

/// Kind of sub-collection owned by a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Child slot entries
    Children,
    /// Parameters
    Parameters,
    /// Calculations
    Calculations,
    /// Instances
    Instances,
    /// Outbound component references
    References,
}

impl CollectionKind {
    /// The collection of this kind owned by `owner`
    pub fn of(self, owner: ComponentKey) -> CollectionRef {
        match self {
            Self::Children => CollectionRef::Children(owner),
            Self::Parameters => CollectionRef::Parameters(owner),
            Self::Calculations => CollectionRef::Calculations(owner),
            Self::Instances => CollectionRef::Instances(owner),
            Self::References => CollectionRef::References(owner),
        }
    }
}

/// Any managed collection of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionRef {
    /// Top-level components of the project
    Root,
    /// Child slot entries of a component
    Children(ComponentKey),
    /// Parameters of a component
    Parameters(ComponentKey),
    /// Calculations of a component
    Calculations(ComponentKey),
    /// Instances of a component
    Instances(ComponentKey),
    /// Outbound references of a component
    References(ComponentKey),
}

impl CollectionRef {
    /// Component owning this collection; `None` for the root collection
    pub fn owner(&self) -> Option<ComponentKey> {
        match self {
            Self::Root => None,
            Self::Children(owner)
            | Self::Parameters(owner)
            | Self::Calculations(owner)
            | Self::Instances(owner)
            | Self::References(owner) => Some(*owner),
        }
    }

    /// Kind of the collection; `None` for the root collection
    pub fn kind(&self) -> Option<CollectionKind> {
        match self {
            Self::Root => None,
            Self::Children(_) => Some(CollectionKind::Children),
            Self::Parameters(_) => Some(CollectionKind::Parameters),
            Self::Calculations(_) => Some(CollectionKind::Calculations),
            Self::Instances(_) => Some(CollectionKind::Instances),
            Self::References(_) => Some(CollectionKind::References),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.owner()) {
            (Some(kind), Some(owner)) => write!(f, "{kind:?} of {owner:?}"),
            _ => write!(f, "root components"),
        }
    }
}
