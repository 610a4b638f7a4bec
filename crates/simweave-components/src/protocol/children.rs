//! Child slot entries and component moves
//!
//! Structural changes to a parent's children need write access on the parent
//! and on every child component entering or leaving; only the parent is
//! stamped. A filled entry always satisfies
//! `component.current_slot == entry.slot.base`.

use super::{guard_list, IdentityPlan};
use crate::events::{CollectionChange, Property, ProjectEvent, RemovedItem};
use crate::object::{CollectionRef, ComponentKey, EntryKey, ObjectRef};
use crate::project::Project;
use crate::slots::{ChildSlotEntry, Slot, SlotBase};
use simweave_core::{Identifier, Result, SimError, SimUser};
use tracing::debug;

/// Target of [`Project::move_component`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The root collection
    Root,
    /// A new child entry of `parent` at `slot`
    Child {
        /// New parent
        parent: ComponentKey,
        /// Slot of the new entry; its base must match the component's current slot
        slot: Slot,
    },
}

impl Project {
    /// Add a child entry at `slot`, optionally filled with a detached component
    pub fn add_child(
        &mut self,
        user: &SimUser,
        parent: ComponentKey,
        slot: Slot,
        component: Option<ComponentKey>,
    ) -> Result<EntryKey> {
        self.node(parent)?;
        self.check_slot_free(parent, &slot, None)?;
        let plans = match component {
            Some(child) => self.check_child_placement(parent, &slot, child, false)?,
            None => Vec::new(),
        };
        self.require_write(user, &guard_list([parent], [component]), "add child")?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        let entry = self
            .entries
            .insert(ChildSlotEntry::new(slot, parent, component));
        if let Some(child) = component {
            self.attach_child(parent, entry, child, plans);
        }
        if let Some(node) = self.components.get_mut(parent) {
            node.children.push(entry);
        }
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Children(parent),
            change: CollectionChange::Added(vec![entry.into()]),
        });
        self.apply_stamp(user, &stamp);
        debug!(?parent, ?entry, ?component, user = user.name(), "Child entry added");
        self.finish(entry)
    }

    /// Remove a child entry and delete its component
    pub fn remove_child(&mut self, user: &SimUser, parent: ComponentKey, entry: EntryKey) -> Result<()> {
        self.remove_entry(user, parent, entry, true).map(|_| ())
    }

    /// Remove a child entry, keeping its component's identity; returns the component
    pub fn remove_child_without_delete(
        &mut self,
        user: &SimUser,
        parent: ComponentKey,
        entry: EntryKey,
    ) -> Result<Option<ComponentKey>> {
        self.remove_entry(user, parent, entry, false)
    }

    /// Replace the entry at `index` of `parent`; the old entry's component is deleted
    pub fn replace_child(
        &mut self,
        user: &SimUser,
        parent: ComponentKey,
        index: usize,
        slot: Slot,
        component: Option<ComponentKey>,
    ) -> Result<EntryKey> {
        let old_entry = self.node(parent)?.children.get(index).ok_or_else(|| {
            SimError::not_found(format!("no child entry at index {index}"))
        })?;
        self.check_slot_free(parent, &slot, Some(old_entry))?;
        let plans = match component {
            Some(child) => self.check_child_placement(parent, &slot, child, false)?,
            None => Vec::new(),
        };
        let old_component = self.entries.get(old_entry).and_then(|e| e.component);
        self.require_write(
            user,
            &guard_list([parent], [old_component, component]),
            "replace child",
        )?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        let removed = self.take_entry(old_entry);
        self.emit_parent_changed(old_component);
        let entry = self
            .entries
            .insert(ChildSlotEntry::new(slot, parent, component));
        if let Some(child) = component {
            self.attach_child(parent, entry, child, plans);
        }
        if let Some(node) = self.components.get_mut(parent) {
            node.children.replace(index, entry);
        }
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Children(parent),
            change: CollectionChange::Replaced {
                old: removed,
                new: entry.into(),
            },
        });
        self.apply_stamp(user, &stamp);
        if let Some(old) = old_component {
            self.delete_subtree(old);
        }
        debug!(?parent, ?old_entry, ?entry, user = user.name(), "Child entry replaced");
        self.finish(entry)
    }

    /// Remove every child entry of `parent`, deleting their components
    ///
    /// Write access on the parent and on every child is checked before
    /// anything is removed.
    pub fn clear_children(&mut self, user: &SimUser, parent: ComponentKey) -> Result<()> {
        let entries = self.node(parent)?.children.items().to_vec();
        if entries.is_empty() {
            return Ok(());
        }
        let components: Vec<ComponentKey> = entries
            .iter()
            .filter_map(|entry| self.entries.get(*entry).and_then(|e| e.component))
            .collect();
        self.require_write(
            user,
            &guard_list([parent], components.iter().copied().map(Some)),
            "clear children",
        )?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        if let Some(node) = self.components.get_mut(parent) {
            node.children.take_all();
        }
        let mut removed = Vec::with_capacity(entries.len());
        for entry in &entries {
            let component = self.entries.get(*entry).and_then(|e| e.component);
            removed.push(self.take_entry(*entry));
            self.emit_parent_changed(component);
        }
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Children(parent),
            change: CollectionChange::Reset(removed),
        });
        self.apply_stamp(user, &stamp);
        for component in components {
            self.delete_subtree(component);
        }
        debug!(?parent, count = entries.len(), user = user.name(), "Children cleared");
        self.finish(())
    }

    /// Fill, refill or empty an entry; a replaced component is deleted
    pub fn set_entry_component(
        &mut self,
        user: &SimUser,
        entry: EntryKey,
        component: Option<ComponentKey>,
    ) -> Result<()> {
        let (parent, slot, old) = self.owned_entry(entry)?;
        if old == component {
            return Ok(());
        }
        let plans = match component {
            Some(child) => self.check_child_placement(parent, &slot, child, false)?,
            None => Vec::new(),
        };
        self.require_write(user, &guard_list([parent], [old, component]), "set entry component")?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        if let Some(previous) = old {
            if let Some(node) = self.components.get_mut(previous) {
                node.detach();
            }
            self.emit(ProjectEvent::PropertyChanged {
                object: previous.into(),
                property: Property::Parent,
            });
        }
        if let Some(slot_entry) = self.entries.get_mut(entry) {
            slot_entry.component = component;
        }
        if let Some(child) = component {
            self.attach_child(parent, entry, child, plans);
        }
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.emit(ProjectEvent::PropertyChanged {
            object: entry.into(),
            property: Property::Component,
        });
        self.apply_stamp(user, &stamp);
        if let Some(previous) = old {
            self.delete_subtree(previous);
        }
        debug!(?entry, ?old, ?component, user = user.name(), "Entry component set");
        self.finish(())
    }

    /// Change the slot of an entry, syncing the filling component's current slot
    pub fn set_entry_slot(&mut self, user: &SimUser, entry: EntryKey, slot: Slot) -> Result<()> {
        let (parent, current, component) = self.owned_entry(entry)?;
        if current == slot {
            return Ok(());
        }
        self.check_slot_free(parent, &slot, Some(entry))?;
        self.require_write(user, &guard_list([parent], [component]), "set entry slot")?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        let base = slot.base().clone();
        if let Some(slot_entry) = self.entries.get_mut(entry) {
            slot_entry.slot = slot;
        }
        self.emit(ProjectEvent::PropertyChanged {
            object: entry.into(),
            property: Property::Slot,
        });
        if let Some(child) = component {
            self.sync_current_slot(child, base);
        }
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.apply_stamp(user, &stamp);
        self.finish(())
    }

    /// Change a component's current slot, syncing the base of its entry
    pub fn set_current_slot(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        base: SlotBase,
    ) -> Result<()> {
        let node = self.node(component)?;
        if node.current_slot == base {
            return Ok(());
        }
        let container = node.parent_container;
        let parent = node.parent;
        let moved_slot = match container {
            Some(entry) => {
                let slot = self
                    .entries
                    .get(entry)
                    .map(|e| e.slot.with_base(base.clone()))
                    .ok_or_else(|| SimError::invalid_argument(format!("unknown entry {entry:?}")))?;
                if let Some(parent) = parent {
                    self.check_slot_free(parent, &slot, Some(entry))?;
                }
                Some((entry, slot))
            }
            None => None,
        };
        self.require_write(user, &guard_list([component], [parent]), "set current slot")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        if let Some(node) = self.components.get_mut(component) {
            node.current_slot = base;
        }
        self.emit(ProjectEvent::PropertyChanged {
            object: component.into(),
            property: Property::CurrentSlot,
        });
        if let Some((entry, slot)) = moved_slot {
            if let Some(slot_entry) = self.entries.get_mut(entry) {
                slot_entry.slot = slot;
            }
            self.emit(ProjectEvent::PropertyChanged {
                object: entry.into(),
                property: Property::Slot,
            });
            if let Some(parent) = parent {
                self.record_change(CollectionRef::Children(parent), stamp.at());
            }
        }
        self.apply_stamp(user, &stamp);
        self.finish(())
    }

    /// Rename a component
    pub fn rename_component(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        name: impl Into<String>,
    ) -> Result<()> {
        self.node(component)?;
        self.require_write(user, &[component], "rename component")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        if let Some(node) = self.components.get_mut(component) {
            node.name = name.into();
        }
        self.emit(ProjectEvent::PropertyChanged {
            object: component.into(),
            property: Property::Name,
        });
        self.apply_stamp(user, &stamp);
        self.finish(())
    }

    /// Move a component to the root collection or under another parent
    ///
    /// The component keeps its identifier and no deletion is announced. Write
    /// access is required on the component, its current parent and the new
    /// parent. Returns the new entry when moving under a parent.
    pub fn move_component(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
        destination: Destination,
    ) -> Result<Option<EntryKey>> {
        let node = self.node(component)?;
        let source = node.factory;
        let source_entry = node.parent_container;
        let source_parent = node.parent;
        let plans = match &destination {
            Destination::Root => {
                if source == Some(CollectionRef::Root) {
                    return Err(SimError::duplicate(format!(
                        "component '{}' is already a root component",
                        node.name
                    )));
                }
                self.plan_subtree(component)?
            }
            Destination::Child { parent, slot } => {
                self.node(*parent)?;
                self.check_slot_free(*parent, slot, None)?;
                self.check_child_placement(*parent, slot, component, true)?;
                self.plan_subtree(component)?
            }
        };
        let new_parent = match &destination {
            Destination::Root => None,
            Destination::Child { parent, .. } => Some(*parent),
        };
        self.require_write(
            user,
            &guard_list([component], [source_parent, new_parent]),
            "move component",
        )?;
        let stamp_owners = guard_list(source_parent, [Some(new_parent.unwrap_or(component))]);
        let stamp = self.prepare_stamp(user, &stamp_owners)?;

        match source {
            Some(CollectionRef::Root) => {
                self.root.remove(component);
                let identifier = self.identifier_of(component.into());
                self.record_change(CollectionRef::Root, stamp.at());
                self.emit(ProjectEvent::CollectionChanged {
                    collection: CollectionRef::Root,
                    change: CollectionChange::Removed(vec![RemovedItem {
                        object: component.into(),
                        identifier,
                    }]),
                });
            }
            Some(CollectionRef::Children(parent)) => {
                if let Some(entry) = source_entry {
                    if let Some(node) = self.components.get_mut(parent) {
                        node.children.remove(entry);
                    }
                    let removed = self.take_entry(entry);
                    self.record_change(CollectionRef::Children(parent), stamp.at());
                    self.emit(ProjectEvent::CollectionChanged {
                        collection: CollectionRef::Children(parent),
                        change: CollectionChange::Removed(vec![removed]),
                    });
                }
            }
            _ => {}
        }
        if let Some(node) = self.components.get_mut(component) {
            node.detach();
        }

        let placed = match destination {
            Destination::Root => {
                self.attach_subtree(component, plans);
                if let Some(node) = self.components.get_mut(component) {
                    node.factory = Some(CollectionRef::Root);
                }
                self.root.push(component);
                self.record_change(CollectionRef::Root, stamp.at());
                self.emit(ProjectEvent::CollectionChanged {
                    collection: CollectionRef::Root,
                    change: CollectionChange::Added(vec![component.into()]),
                });
                None
            }
            Destination::Child { parent, slot } => {
                let entry = self
                    .entries
                    .insert(ChildSlotEntry::new(slot, parent, Some(component)));
                self.wire_child(parent, entry, component, plans);
                if let Some(node) = self.components.get_mut(parent) {
                    node.children.push(entry);
                }
                self.record_change(CollectionRef::Children(parent), stamp.at());
                self.emit(ProjectEvent::CollectionChanged {
                    collection: CollectionRef::Children(parent),
                    change: CollectionChange::Added(vec![entry.into()]),
                });
                Some(entry)
            }
        };
        self.emit_parent_changed(Some(component));
        self.apply_stamp(user, &stamp);
        debug!(?component, ?new_parent, user = user.name(), "Component moved");
        self.finish(placed)
    }

    fn remove_entry(
        &mut self,
        user: &SimUser,
        parent: ComponentKey,
        entry: EntryKey,
        delete: bool,
    ) -> Result<Option<ComponentKey>> {
        let node = self.node(parent)?;
        if !node.children.contains(entry) {
            return Err(SimError::not_found(format!(
                "entry {entry:?} is not a child of '{}'",
                node.name
            )));
        }
        let component = self.entries.get(entry).and_then(|e| e.component);
        self.require_write(user, &guard_list([parent], [component]), "remove child")?;
        let stamp = self.prepare_stamp(user, &[parent])?;

        if let Some(node) = self.components.get_mut(parent) {
            node.children.remove(entry);
        }
        let removed = self.take_entry(entry);
        self.emit_parent_changed(component);
        self.record_change(CollectionRef::Children(parent), stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Children(parent),
            change: CollectionChange::Removed(vec![removed]),
        });
        self.apply_stamp(user, &stamp);
        if delete {
            if let Some(child) = component {
                self.delete_subtree(child);
            }
        }
        debug!(?parent, ?entry, delete, user = user.name(), "Child entry removed");
        self.finish(component)
    }

    /// Parent, slot and component of an entry that is part of a component
    fn owned_entry(&self, entry: EntryKey) -> Result<(ComponentKey, Slot, Option<ComponentKey>)> {
        let slot_entry = self
            .entries
            .get(entry)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown entry {entry:?}")))?;
        let parent = slot_entry.parent.ok_or_else(|| {
            SimError::invalid_argument(format!("entry {entry:?} is not part of a component"))
        })?;
        Ok((parent, slot_entry.slot.clone(), slot_entry.component))
    }

    fn check_slot_free(&self, parent: ComponentKey, slot: &Slot, except: Option<EntryKey>) -> Result<()> {
        let node = self.node(parent)?;
        let taken = node.children.iter().any(|entry| {
            Some(entry) != except && self.entries.get(entry).is_some_and(|e| e.slot == *slot)
        });
        if taken {
            return Err(SimError::duplicate(format!(
                "slot '{slot}' is already used in '{}'",
                node.name
            )));
        }
        Ok(())
    }

    /// Validate placing `component` in an entry of `parent` at `slot`
    ///
    /// When `moving`, the component's current ownership is about to be
    /// released and is not held against it.
    fn check_child_placement(
        &self,
        parent: ComponentKey,
        slot: &Slot,
        component: ComponentKey,
        moving: bool,
    ) -> Result<Vec<(ObjectRef, IdentityPlan)>> {
        let node = self.node(component)?;
        if self.is_ancestor_or_self(component, parent) {
            return Err(SimError::invalid_argument(format!(
                "component '{}' cannot become a child of itself or its descendants",
                node.name
            )));
        }
        if !moving {
            match node.factory {
                Some(CollectionRef::Children(owner)) if owner == parent => {
                    return Err(SimError::duplicate(format!(
                        "component '{}' is already a child of this parent",
                        node.name
                    )));
                }
                Some(owner) => {
                    return Err(SimError::unsupported(format!(
                        "component '{}' is owned by {owner}",
                        node.name
                    )));
                }
                None => {}
            }
        }
        if node.current_slot != *slot.base() {
            return Err(SimError::invalid_argument(format!(
                "component '{}' fills slot '{}' but the entry expects '{}'",
                node.name,
                node.current_slot,
                slot.base()
            )));
        }
        if moving {
            Ok(Vec::new())
        } else {
            self.plan_subtree(component)
        }
    }

    fn attach_child(
        &mut self,
        parent: ComponentKey,
        entry: EntryKey,
        component: ComponentKey,
        plans: Vec<(ObjectRef, IdentityPlan)>,
    ) {
        self.wire_child(parent, entry, component, plans);
        self.emit_parent_changed(Some(component));
    }

    fn wire_child(
        &mut self,
        parent: ComponentKey,
        entry: EntryKey,
        component: ComponentKey,
        plans: Vec<(ObjectRef, IdentityPlan)>,
    ) {
        self.attach_subtree(component, plans);
        if let Some(node) = self.components.get_mut(component) {
            node.parent = Some(parent);
            node.parent_container = Some(entry);
            node.factory = Some(CollectionRef::Children(parent));
        }
    }

    /// Unwire an entry from its component and drop it from storage
    ///
    /// The caller removes the entry from the parent's children and announces
    /// the component's parent change.
    fn take_entry(&mut self, entry: EntryKey) -> RemovedItem {
        let component = self.entries.remove(entry).and_then(|slot_entry| slot_entry.component);
        let identifier = match component {
            Some(child) => {
                let id = self.identifier_of(child.into());
                if let Some(node) = self.components.get_mut(child) {
                    node.detach();
                }
                id
            }
            None => Identifier::EMPTY,
        };
        RemovedItem {
            object: entry.into(),
            identifier,
        }
    }

    fn emit_parent_changed(&mut self, component: Option<ComponentKey>) {
        if let Some(component) = component {
            self.emit(ProjectEvent::PropertyChanged {
                object: component.into(),
                property: Property::Parent,
            });
        }
    }

    fn sync_current_slot(&mut self, component: ComponentKey, base: SlotBase) {
        let changed = match self.components.get_mut(component) {
            Some(node) if node.current_slot != base => {
                node.current_slot = base;
                true
            }
            _ => false,
        };
        if changed {
            self.emit(ProjectEvent::PropertyChanged {
                object: component.into(),
                property: Property::CurrentSlot,
            });
        }
    }
}
