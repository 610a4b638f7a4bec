//! Items owned by a component
//!
//! Parameters, calculations and instances only matter here for their identity
//! and ownership; their values are interpreted by external engines. All owned
//! item types (component references included) go through the same managed
//! collection protocol via [`OwnedItem`].

use crate::collection::ManagedCollection;
use crate::component::ComponentNode;
use crate::object::{CollectionKind, ComponentKey, ObjectRef};
use crate::project::Project;
use crate::store::{Arena, Key};
use serde::{Deserialize, Serialize};
use simweave_core::Identifier;
use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Object that can be looked up by identifier
pub trait Identified: sealed::Sealed + Sized {
    /// Typed key behind `object`, if it addresses this type
    fn from_object(object: ObjectRef) -> Option<Key<Self>>;
}

/// Item stored in one of a component's owned collections
pub trait OwnedItem: Identified + fmt::Debug + 'static {
    /// Collection kind holding items of this type
    const KIND: CollectionKind;

    /// Whether items of this type carry a project identifier
    const IDENTIFIED: bool;

    /// Current identifier, empty for unidentified item types
    fn identifier(&self) -> Identifier;

    /// Owning component, `None` while detached
    fn owner(&self) -> Option<ComponentKey>;

    /// Erased handle of `key`
    fn object(key: Key<Self>) -> ObjectRef;

    #[doc(hidden)]
    fn set_identifier(&mut self, id: Identifier);

    #[doc(hidden)]
    fn set_owner(&mut self, owner: Option<ComponentKey>);

    #[doc(hidden)]
    fn arena(project: &Project) -> &Arena<Self>;

    #[doc(hidden)]
    fn arena_mut(project: &mut Project) -> &mut Arena<Self>;

    #[doc(hidden)]
    fn collection(node: &ComponentNode) -> &ManagedCollection<Key<Self>>;

    #[doc(hidden)]
    fn collection_mut(node: &mut ComponentNode) -> &mut ManagedCollection<Key<Self>>;
}

impl sealed::Sealed for ComponentNode {}

impl Identified for ComponentNode {
    fn from_object(object: ObjectRef) -> Option<Key<Self>> {
        match object {
            ObjectRef::Component(key) => Some(key),
            _ => None,
        }
    }
}

/// Numeric parameter of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(skip)]
    id: Identifier,
    name: String,
    unit: String,
    value: f64,
    #[serde(skip)]
    owner: Option<ComponentKey>,
}

impl Parameter {
    /// Detached parameter
    pub fn new(name: impl Into<String>, unit: impl Into<String>, value: f64) -> Self {
        Self {
            id: Identifier::EMPTY,
            name: name.into(),
            unit: unit.into(),
            value,
            owner: None,
        }
    }

    /// Pre-assigned identifier for loaders
    pub fn with_identifier(mut self, id: Identifier) -> Self {
        self.id = id;
        self
    }

    /// Identifier, empty until first inserted
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit label
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Expression computed by the value engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    #[serde(skip)]
    id: Identifier,
    name: String,
    expression: String,
    #[serde(skip)]
    owner: Option<ComponentKey>,
}

impl Calculation {
    /// Detached calculation
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: Identifier::EMPTY,
            name: name.into(),
            expression: expression.into(),
            owner: None,
        }
    }

    /// Pre-assigned identifier for loaders
    pub fn with_identifier(mut self, id: Identifier) -> Self {
        self.id = id;
        self
    }

    /// Identifier, empty until first inserted
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Calculation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source expression
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// What an [`Instance`] places the component into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceType {
    /// Geometric volume or face
    Entity3D,
    /// Face attribute
    AttributesFace,
    /// Node of a network
    NetworkNode,
    /// Edge of a network
    NetworkEdge,
    /// Grouping without geometry
    Group,
}

/// Placement of a component in geometry or a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(skip)]
    id: Identifier,
    name: String,
    instance_type: InstanceType,
    #[serde(skip)]
    owner: Option<ComponentKey>,
}

impl Instance {
    /// Detached instance
    pub fn new(name: impl Into<String>, instance_type: InstanceType) -> Self {
        Self {
            id: Identifier::EMPTY,
            name: name.into(),
            instance_type,
            owner: None,
        }
    }

    /// Pre-assigned identifier for loaders
    pub fn with_identifier(mut self, id: Identifier) -> Self {
        self.id = id;
        self
    }

    /// Identifier, empty until first inserted
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement kind
    pub fn instance_type(&self) -> InstanceType {
        self.instance_type
    }
}

macro_rules! identified_item {
    ($ty:ident, $variant:ident, $kind:ident, $arena:ident, $collection:ident) => {
        impl sealed::Sealed for $ty {}

        impl Identified for $ty {
            fn from_object(object: ObjectRef) -> Option<Key<Self>> {
                match object {
                    ObjectRef::$variant(key) => Some(key),
                    _ => None,
                }
            }
        }

        impl OwnedItem for $ty {
            const KIND: CollectionKind = CollectionKind::$kind;
            const IDENTIFIED: bool = true;

            fn identifier(&self) -> Identifier {
                self.id
            }

            fn owner(&self) -> Option<ComponentKey> {
                self.owner
            }

            fn object(key: Key<Self>) -> ObjectRef {
                ObjectRef::$variant(key)
            }

            fn set_identifier(&mut self, id: Identifier) {
                self.id = id;
            }

            fn set_owner(&mut self, owner: Option<ComponentKey>) {
                self.owner = owner;
            }

            fn arena(project: &Project) -> &Arena<Self> {
                &project.$arena
            }

            fn arena_mut(project: &mut Project) -> &mut Arena<Self> {
                &mut project.$arena
            }

            fn collection(node: &ComponentNode) -> &ManagedCollection<Key<Self>> {
                &node.$collection
            }

            fn collection_mut(node: &mut ComponentNode) -> &mut ManagedCollection<Key<Self>> {
                &mut node.$collection
            }
        }
    };
}

identified_item!(Parameter, Parameter, Parameters, parameters, parameters);
identified_item!(Calculation, Calculation, Calculations, calculations, calculations);
identified_item!(Instance, Instance, Instances, instances, instances);

pub(crate) use sealed::Sealed;
