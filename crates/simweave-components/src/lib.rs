//! Simweave Components - ownership, collections and references
//!
//! This crate builds the component tree on top of `simweave-core`:
//!
//! - [`Project`] owns every object in typed arenas addressed by [`Key`]
//!   handles and carries the identity allocator, the root collection and the
//!   listener registry
//! - [`ComponentNode`] with its child slots, parameters, calculations,
//!   instances and [`ComponentReference`]s
//! - the managed collection protocol: every add, remove, replace, clear and
//!   move is checked against the acting user's write access, assigns or
//!   releases identifiers, stamps audit timestamps and raises
//!   [`ProjectEvent`]s only after the change committed
//!
//! # Example
//!
//! ```
//! use simweave_components::{Parameter, Project};
//! use simweave_core::{SimUser, SimUserRole};
//!
//! let mut project = Project::new();
//! let admin = SimUser::new("admin", SimUserRole::Administrator);
//!
//! let wall = project.create_component("Wall");
//! project.add_component(&admin, wall)?;
//!
//! let width = project.insert_item(Parameter::new("width", "m", 0.3));
//! project.add_item(&admin, wall, width)?;
//! assert!(project.item(width).map_or(false, |p| p.id().is_located()));
//!
//! project.remove_component(&admin, wall)?;
//! assert_eq!(project.identified_count(), 0);
//! # Ok::<(), simweave_core::SimError>(())
//! ```

#![forbid(unsafe_code)]

/// Managed collection membership and change tracking
pub mod collection;

/// Component nodes
pub mod component;

/// Change notifications and listeners
pub mod events;

/// Structural consistency checks
mod integrity;

/// Parameters, calculations and instances
pub mod items;

/// Object handles and collection addresses
pub mod object;

/// Project context
pub mod project;

/// Access-checked collection operations
mod protocol;

/// Component references
pub mod reference;

/// Taxonomy slots and child entries
pub mod slots;

/// Typed arenas
pub mod store;

pub use collection::{ChangeTracker, ManagedCollection};
pub use component::ComponentNode;
pub use events::{
    CollectionChange, ListenerId, ProjectEvent, ProjectListener, Property, RemovedItem,
};
pub use items::{Calculation, Identified, Instance, InstanceType, OwnedItem, Parameter};
pub use object::{
    CalculationKey, CollectionKind, CollectionRef, ComponentKey, EntryKey, InstanceKey, ObjectRef,
    ParameterKey, ReferenceKey,
};
pub use project::Project;
pub use protocol::Destination;
pub use reference::ComponentReference;
pub use slots::{ChildSlotEntry, Slot, SlotBase, SlotTaxonomy, StaticTaxonomy};
pub use store::{Arena, Key};
