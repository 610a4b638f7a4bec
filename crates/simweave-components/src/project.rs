//! Project context
//!
//! A [`Project`] owns every object of one model: the arenas, the identity
//! allocator, the root component collection, the registered listeners and the
//! access-check scope. All mutations go through it; see the `protocol`
//! modules for the managed collection operations.

use crate::collection::{ChangeTracker, ManagedCollection};
use crate::component::ComponentNode;
use crate::events::{EventBus, ListenerId, ProjectEvent, ProjectListener};
use crate::items::{Calculation, Identified, Instance, OwnedItem, Parameter};
use crate::object::{CollectionRef, ComponentKey, EntryKey, ObjectRef, ReferenceKey};
use crate::reference::ComponentReference;
use crate::slots::{ChildSlotEntry, SlotBase, SlotTaxonomy, StaticTaxonomy};
use crate::store::{Arena, Key};
use indexmap::IndexMap;
use simweave_core::{
    Clock, IdGenerator, Identifier, ProjectConfig, ProjectHandle, Result, SimError, SimUserRole,
    SystemClock, Timestamp,
};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One in-memory model with its identity space, objects and listeners
pub struct Project {
    pub(crate) ids: IdGenerator<ObjectRef>,
    config: ProjectConfig,
    clock: Box<dyn Clock>,
    taxonomy: Box<dyn SlotTaxonomy>,
    pub(crate) components: Arena<ComponentNode>,
    pub(crate) entries: Arena<ChildSlotEntry>,
    pub(crate) parameters: Arena<Parameter>,
    pub(crate) calculations: Arena<Calculation>,
    pub(crate) instances: Arena<Instance>,
    pub(crate) references: Arena<ComponentReference>,
    /// Owned references waiting for their target, by target local id
    pub(crate) pending_references: IndexMap<u64, Vec<ReferenceKey>>,
    pub(crate) root: ManagedCollection<ComponentKey>,
    pub(crate) events: EventBus,
    access_check_suspensions: usize,
}

impl Project {
    /// Empty project with default configuration and a random global id
    pub fn new() -> Self {
        Self::from_parts(ProjectConfig::default(), Uuid::new_v4())
    }

    /// Empty project using `config`
    pub fn with_config(config: ProjectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, Uuid::new_v4()))
    }

    /// Empty project reusing a known global id, for loading saved models
    pub fn open(config: ProjectConfig, global_id: Uuid) -> Result<Self> {
        config.validate()?;
        if global_id.is_nil() {
            return Err(SimError::invalid_argument(
                "project global id must not be nil",
            ));
        }
        Ok(Self::from_parts(config, global_id))
    }

    fn from_parts(config: ProjectConfig, global_id: Uuid) -> Self {
        let handle = ProjectHandle::allocate();
        debug!(%handle, %global_id, "Creating project");
        Self {
            ids: IdGenerator::new(handle, global_id),
            taxonomy: Box::new(StaticTaxonomy::new(config.default_slot.clone())),
            config,
            clock: Box::new(SystemClock),
            components: Arena::new(),
            entries: Arena::new(),
            parameters: Arena::new(),
            calculations: Arena::new(),
            instances: Arena::new(),
            references: Arena::new(),
            pending_references: IndexMap::new(),
            root: ManagedCollection::default(),
            events: EventBus::default(),
            access_check_suspensions: 0,
        }
    }

    /// Replace the clock used for audit stamps and change tracking
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the slot vocabulary
    pub fn with_taxonomy(mut self, taxonomy: impl SlotTaxonomy + 'static) -> Self {
        self.taxonomy = Box::new(taxonomy);
        self
    }

    /// Location stamped into identifiers issued by this project
    pub fn handle(&self) -> ProjectHandle {
        self.ids.location()
    }

    /// Global id shared by all identifiers of this project
    pub fn global_id(&self) -> Uuid {
        self.ids.global_id()
    }

    /// Active configuration
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Slot vocabulary
    pub fn taxonomy(&self) -> &dyn SlotTaxonomy {
        self.taxonomy.as_ref()
    }

    /// Current time of the project clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Slot given to components created without one
    pub fn default_slot(&self) -> SlotBase {
        self.taxonomy.default_slot()
    }

    /// Resolve a taxonomy key
    pub fn resolve_slot(&self, key: &str) -> Result<SlotBase> {
        self.taxonomy
            .resolve(key)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown slot '{key}'")))
    }

    /// Store a detached component
    pub fn insert_component(&mut self, node: ComponentNode) -> ComponentKey {
        self.components.insert(node)
    }

    /// Create a detached component with the configured creator role and default slot
    pub fn create_component(&mut self, name: impl Into<String>) -> ComponentKey {
        let node = ComponentNode::new(name, self.config.default_creator_role, self.default_slot());
        self.insert_component(node)
    }

    /// Create a detached component created by `creator` in `slot`
    pub fn create_component_as(
        &mut self,
        name: impl Into<String>,
        creator: SimUserRole,
        slot: SlotBase,
    ) -> ComponentKey {
        self.insert_component(ComponentNode::new(name, creator, slot))
    }

    /// Store a detached parameter, calculation, instance or reference
    pub fn insert_item<T: OwnedItem>(&mut self, item: T) -> Key<T> {
        T::arena_mut(self).insert(item)
    }

    /// Component behind `key`
    pub fn component(&self, key: ComponentKey) -> Option<&ComponentNode> {
        self.components.get(key)
    }

    /// Child entry behind `key`
    pub fn entry(&self, key: EntryKey) -> Option<&ChildSlotEntry> {
        self.entries.get(key)
    }

    /// Reference behind `key`
    pub fn reference(&self, key: ReferenceKey) -> Option<&ComponentReference> {
        self.references.get(key)
    }

    /// Owned item behind `key`
    pub fn item<T: OwnedItem>(&self, key: Key<T>) -> Option<&T> {
        T::arena(self).get(key)
    }

    /// All stored components, attached or not
    pub fn components(&self) -> impl Iterator<Item = (ComponentKey, &ComponentNode)> {
        self.components.iter()
    }

    /// Top-level components
    pub fn root_components(&self) -> &ManagedCollection<ComponentKey> {
        &self.root
    }

    /// Typed lookup of a live object by identifier
    ///
    /// Released and foreign identifiers resolve to nothing.
    pub fn get_by_id<T: Identified>(&self, id: &Identifier) -> Option<Key<T>> {
        self.ids.get(id).and_then(T::from_object)
    }

    /// Untyped lookup of a live object by identifier
    pub fn object_by_id(&self, id: &Identifier) -> Option<ObjectRef> {
        self.ids.get(id)
    }

    /// Number of objects currently holding an identifier
    pub fn identified_count(&self) -> usize {
        self.ids.len()
    }

    /// Identifier of `object`; empty for objects without identity
    pub fn identifier_of(&self, object: ObjectRef) -> Identifier {
        match object {
            ObjectRef::Component(key) => self.components.get(key).map(|n| n.id),
            ObjectRef::Parameter(key) => self.parameters.get(key).map(OwnedItem::identifier),
            ObjectRef::Calculation(key) => self.calculations.get(key).map(OwnedItem::identifier),
            ObjectRef::Instance(key) => self.instances.get(key).map(OwnedItem::identifier),
            ObjectRef::ChildEntry(_) | ObjectRef::Reference(_) => None,
        }
        .unwrap_or(Identifier::EMPTY)
    }

    pub(crate) fn set_identifier_of(&mut self, object: ObjectRef, id: Identifier) {
        match object {
            ObjectRef::Component(key) => {
                if let Some(node) = self.components.get_mut(key) {
                    node.id = id;
                }
            }
            ObjectRef::Parameter(key) => {
                if let Some(item) = self.parameters.get_mut(key) {
                    item.set_identifier(id);
                }
            }
            ObjectRef::Calculation(key) => {
                if let Some(item) = self.calculations.get_mut(key) {
                    item.set_identifier(id);
                }
            }
            ObjectRef::Instance(key) => {
                if let Some(item) = self.instances.get_mut(key) {
                    item.set_identifier(id);
                }
            }
            ObjectRef::ChildEntry(_) | ObjectRef::Reference(_) => {}
        }
    }

    /// Change state of `collection`, `None` if its owner is unknown
    pub fn changes(&self, collection: CollectionRef) -> Option<&ChangeTracker> {
        let node = match collection {
            CollectionRef::Root => return Some(self.root.changes()),
            other => self.components.get(other.owner()?)?,
        };
        Some(match collection {
            CollectionRef::Children(_) => node.children.changes(),
            CollectionRef::Parameters(_) => node.parameters.changes(),
            CollectionRef::Calculations(_) => node.calculations.changes(),
            CollectionRef::Instances(_) => node.instances.changes(),
            CollectionRef::References(_) | CollectionRef::Root => node.references.changes(),
        })
    }

    /// Clear the change flag of `collection`
    pub fn reset_changes(&mut self, collection: CollectionRef) -> Result<()> {
        let tracker = self.tracker_mut(collection).ok_or_else(|| {
            SimError::invalid_argument(format!("unknown collection {collection}"))
        })?;
        tracker.reset();
        Ok(())
    }

    pub(crate) fn tracker_mut(&mut self, collection: CollectionRef) -> Option<&mut ChangeTracker> {
        let node = match collection {
            CollectionRef::Root => return Some(self.root.tracker_mut()),
            other => self.components.get_mut(other.owner()?)?,
        };
        Some(match collection {
            CollectionRef::Children(_) => node.children.tracker_mut(),
            CollectionRef::Parameters(_) => node.parameters.tracker_mut(),
            CollectionRef::Calculations(_) => node.calculations.tracker_mut(),
            CollectionRef::Instances(_) => node.instances.tracker_mut(),
            CollectionRef::References(_) | CollectionRef::Root => node.references.tracker_mut(),
        })
    }

    pub(crate) fn record_change(&mut self, collection: CollectionRef, at: Timestamp) {
        if let Some(tracker) = self.tracker_mut(collection) {
            tracker.record(at);
        }
    }

    /// Register `listener` for all project events
    pub fn subscribe(&mut self, listener: impl ProjectListener + 'static) -> ListenerId {
        self.subscribe_shared(Rc::new(listener))
    }

    /// Register a shared listener
    pub fn subscribe_shared(&mut self, listener: Rc<dyn ProjectListener>) -> ListenerId {
        let id = self.events.subscribe(listener);
        debug!(listener = %id, "Listener registered");
        id
    }

    /// Remove a listener; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    pub(crate) fn emit(&mut self, event: ProjectEvent) {
        self.events.emit(event);
    }

    /// Deliver queued events unless a dispatch loop further up the stack already runs
    pub(crate) fn flush_events(&mut self) {
        if !self.events.begin_dispatch() {
            return;
        }
        while let Some(event) = self.events.next_pending() {
            for listener in self.events.snapshot() {
                listener.on_event(self, &event);
            }
        }
        self.events.end_dispatch();
    }

    pub(crate) fn finish<T>(&mut self, value: T) -> Result<T> {
        self.flush_events();
        Ok(value)
    }

    /// Enter loading mode: pre-assigned identifiers are reserved on insertion
    pub fn start_loading(&mut self) {
        debug!(project = %self.handle(), "Loading started");
        self.ids.start_loading();
    }

    /// Leave loading mode and bind references whose targets appeared meanwhile
    ///
    /// Returns the number of references that were resolved.
    pub fn end_loading(&mut self) -> usize {
        self.ids.end_loading();
        let resolved = self.resolve_pending_references();
        debug!(project = %self.handle(), resolved, "Loading finished");
        self.flush_events();
        resolved
    }

    /// Whether loading mode is active
    pub fn is_loading(&self) -> bool {
        self.ids.is_loading()
    }

    /// Whether write pre-flight checks are currently enforced
    pub fn access_checking_enabled(&self) -> bool {
        self.config.access_checking && self.access_check_suspensions == 0
    }

    /// Suspend write pre-flight checks; scopes nest
    pub fn disable_access_checking(&mut self) {
        self.access_check_suspensions += 1;
        debug!(depth = self.access_check_suspensions, "Access checking disabled");
    }

    /// Leave one suspension scope
    pub fn enable_access_checking(&mut self) -> Result<()> {
        if self.access_check_suspensions == 0 {
            warn!("Unbalanced access checking scope exit");
            return Err(SimError::unsupported(
                "access checking is not disabled",
            ));
        }
        self.access_check_suspensions -= 1;
        debug!(depth = self.access_check_suspensions, "Access checking scope left");
        Ok(())
    }

    /// Run `f` with write pre-flight checks suspended
    pub fn with_access_checking_disabled<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.disable_access_checking();
        let result = f(self);
        self.access_check_suspensions = self.access_check_suspensions.saturating_sub(1);
        result
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("handle", &self.handle())
            .field("global_id", &self.global_id())
            .field("components", &self.components.len())
            .field("root", &self.root.len())
            .field("identified", &self.ids.len())
            .field("pending_references", &self.pending_references.len())
            .field("events", &self.events)
            .field("access_check_suspensions", &self.access_check_suspensions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simweave_core::ErrorKind;

    #[test]
    fn access_check_scope_nests() {
        let mut project = Project::new();
        assert!(project.access_checking_enabled());
        project.disable_access_checking();
        project.disable_access_checking();
        assert!(project.enable_access_checking().is_ok());
        assert!(!project.access_checking_enabled());
        assert!(project.enable_access_checking().is_ok());
        assert!(project.access_checking_enabled());
        assert_eq!(
            project.enable_access_checking().map_err(|e| e.kind()),
            Err(ErrorKind::UnsupportedOperation)
        );
    }

    #[test]
    fn scoped_suspension_restores_checking() {
        let mut project = Project::new();
        let inside = project.with_access_checking_disabled(|p| p.access_checking_enabled());
        assert!(!inside);
        assert!(project.access_checking_enabled());
    }

    #[test]
    fn config_can_disable_checking() {
        let config = ProjectConfig {
            access_checking: false,
            ..ProjectConfig::default()
        };
        let project = Project::with_config(config).unwrap_or_default();
        assert!(!project.access_checking_enabled());
    }

    #[test]
    fn open_rejects_nil_global_id() {
        let err = Project::open(ProjectConfig::default(), Uuid::nil()).map(|_| ());
        assert_eq!(err.map_err(|e| e.kind()), Err(ErrorKind::InvalidArgument));
    }

    #[test]
    fn created_components_use_configured_defaults() {
        let mut project = Project::new();
        let key = project.create_component("Wall");
        let node = project.component(key).map(|n| (n.current_slot().clone(), n.access_profile().creator()));
        assert_eq!(
            node,
            Some((SlotBase::new("Undefined Slot"), SimUserRole::Administrator))
        );
    }

    #[test]
    fn reset_changes_requires_a_known_owner() {
        let mut project = Project::new();
        let known = project.create_component("Known");
        assert!(project.reset_changes(CollectionRef::Parameters(known)).is_ok());
        assert!(project.reset_changes(CollectionRef::Root).is_ok());

        let mut other = Project::new();
        other.create_component("First");
        let foreign = other.create_component("Second");
        assert_eq!(
            project
                .reset_changes(CollectionRef::Parameters(foreign))
                .map_err(|e| e.kind()),
            Err(ErrorKind::InvalidArgument)
        );
    }
}
