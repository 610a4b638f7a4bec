//! Root component collection
//!
//! Top-level components have no owner, so the write check and the audit stamp
//! target the component itself.

use crate::events::{CollectionChange, Property, ProjectEvent, RemovedItem};
use crate::object::{CollectionRef, ComponentKey};
use crate::project::Project;
use simweave_core::{Result, SimError, SimUser};
use tracing::debug;

impl Project {
    /// Add a detached component to the root collection
    pub fn add_component(&mut self, user: &SimUser, component: ComponentKey) -> Result<()> {
        self.check_root_insert(component)?;
        let plans = self.plan_subtree(component)?;
        self.require_write(user, &[component], "add root component")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        self.attach_subtree(component, plans);
        self.attach_root(component);
        self.root.push(component);
        self.record_change(CollectionRef::Root, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Root,
            change: CollectionChange::Added(vec![component.into()]),
        });
        self.apply_stamp(user, &stamp);
        debug!(?component, user = user.name(), "Root component added");
        self.finish(())
    }

    /// Remove a root component and delete it with its subtree
    pub fn remove_component(&mut self, user: &SimUser, component: ComponentKey) -> Result<()> {
        self.remove_root(user, component, true)
    }

    /// Remove a root component, keeping its identity for a later re-insert
    pub fn remove_component_without_delete(
        &mut self,
        user: &SimUser,
        component: ComponentKey,
    ) -> Result<()> {
        self.remove_root(user, component, false)
    }

    /// Replace the root component at `index`; returns the replaced component
    pub fn replace_component(
        &mut self,
        user: &SimUser,
        index: usize,
        component: ComponentKey,
    ) -> Result<ComponentKey> {
        let old = self.root.get(index).ok_or_else(|| {
            SimError::not_found(format!("no root component at index {index}"))
        })?;
        if old == component {
            return Ok(old);
        }
        self.check_root_insert(component)?;
        let plans = self.plan_subtree(component)?;
        self.require_write(user, &[old, component], "replace root component")?;
        let stamp = self.prepare_stamp(user, &[component])?;

        let removed = self.detach_root(old);
        self.attach_subtree(component, plans);
        self.attach_root(component);
        self.root.replace(index, component);
        self.record_change(CollectionRef::Root, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Root,
            change: CollectionChange::Replaced {
                old: removed,
                new: component.into(),
            },
        });
        self.apply_stamp(user, &stamp);
        self.delete_subtree(old);
        debug!(?old, ?component, user = user.name(), "Root component replaced");
        self.finish(old)
    }

    /// Delete every root component; nothing is removed unless all may be written
    pub fn clear_components(&mut self, user: &SimUser) -> Result<()> {
        let items = self.root.items().to_vec();
        if items.is_empty() {
            return Ok(());
        }
        self.require_write(user, &items, "clear root components")?;
        let at = self.now();

        let removed: Vec<RemovedItem> = self
            .root
            .take_all()
            .into_iter()
            .map(|component| self.detach_root(component))
            .collect();
        self.record_change(CollectionRef::Root, at);
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Root,
            change: CollectionChange::Reset(removed),
        });
        for component in &items {
            self.delete_subtree(*component);
        }
        debug!(count = items.len(), user = user.name(), "Root components cleared");
        self.finish(())
    }

    fn check_root_insert(&self, component: ComponentKey) -> Result<()> {
        let node = self.node(component)?;
        match node.factory {
            Some(CollectionRef::Root) => Err(SimError::duplicate(format!(
                "component '{}' is already a root component",
                node.name
            ))),
            Some(owner) => Err(SimError::unsupported(format!(
                "component '{}' is owned by {owner}",
                node.name
            ))),
            None => Ok(()),
        }
    }

    fn remove_root(&mut self, user: &SimUser, component: ComponentKey, delete: bool) -> Result<()> {
        let node = self.node(component)?;
        if node.factory != Some(CollectionRef::Root) || !self.root.contains(component) {
            return Err(SimError::not_found(format!(
                "component '{}' is not a root component",
                node.name
            )));
        }
        self.require_write(user, &[component], "remove root component")?;
        let at = self.now();

        self.root.remove(component);
        let removed = self.detach_root(component);
        self.record_change(CollectionRef::Root, at);
        self.emit(ProjectEvent::CollectionChanged {
            collection: CollectionRef::Root,
            change: CollectionChange::Removed(vec![removed]),
        });
        if delete {
            self.delete_subtree(component);
        }
        debug!(?component, delete, user = user.name(), "Root component removed");
        self.finish(())
    }

    fn attach_root(&mut self, component: ComponentKey) {
        if let Some(node) = self.components.get_mut(component) {
            node.detach();
            node.factory = Some(CollectionRef::Root);
        }
        self.emit(ProjectEvent::PropertyChanged {
            object: component.into(),
            property: Property::Factory,
        });
    }

    /// Unwire a root component; the caller removes it from the collection
    fn detach_root(&mut self, component: ComponentKey) -> RemovedItem {
        let identifier = self
            .components
            .get_mut(component)
            .map(|node| {
                node.detach();
                node.id
            })
            .unwrap_or_default();
        self.emit(ProjectEvent::PropertyChanged {
            object: component.into(),
            property: Property::Factory,
        });
        RemovedItem {
            object: component.into(),
            identifier,
        }
    }
}
