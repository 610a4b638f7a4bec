//! True deletion
//!
//! Deleting releases identifier locations (local ids are kept on the objects),
//! raises `IsBeingDeleted` once per object, clears inbound references and
//! unbinds outbound ones. The deleted objects stay in the arenas, detached,
//! until [`Project::dispose_component`] drops them.

use crate::events::{Property, ProjectEvent};
use crate::items::OwnedItem;
use crate::object::{ComponentKey, ObjectRef};
use crate::project::Project;
use crate::store::Key;
use simweave_core::{Identifier, Result, SimError};
use tracing::debug;

impl Project {
    /// Delete `root` and everything below it, parents first
    pub(crate) fn delete_subtree(&mut self, root: ComponentKey) {
        for key in self.subtree(root) {
            self.delete_component(key);
        }
    }

    fn delete_component(&mut self, key: ComponentKey) {
        let Some(node) = self.components.get(key) else {
            return;
        };
        let id = node.id;
        let mut owned: Vec<ObjectRef> = Vec::new();
        owned.extend(node.parameters.iter().map(ObjectRef::from));
        owned.extend(node.calculations.iter().map(ObjectRef::from));
        owned.extend(node.instances.iter().map(ObjectRef::from));
        let outbound: Vec<_> = node.references.iter().collect();
        let inbound = node.referenced_by.clone();

        self.release_identity(key.into(), id);
        for object in owned {
            let id = self.identifier_of(object);
            self.release_identity(object, id);
        }
        for reference in outbound {
            self.unbind_reference(reference);
        }
        for reference in inbound {
            if let Some(link) = self.references.get_mut(reference) {
                link.target = None;
                link.target_id = link.target_id.released();
            }
            self.emit(ProjectEvent::PropertyChanged {
                object: reference.into(),
                property: Property::Target,
            });
        }
        if let Some(node) = self.components.get_mut(key) {
            node.referenced_by.clear();
        }
        debug!(component = ?key, identifier = %id, "Component deleted");
    }

    /// Announce deletion of `object` and release its identifier location
    ///
    /// Objects that hold no located identifier were never inserted or are
    /// already deleted; nothing happens for them.
    pub(crate) fn release_identity(&mut self, object: ObjectRef, id: Identifier) {
        if !id.is_located() {
            return;
        }
        self.emit(ProjectEvent::IsBeingDeleted {
            object,
            identifier: id,
        });
        self.ids.remove(&id);
        self.set_identifier_of(object, id.released());
    }

    /// Delete a detached object and reset its identifier to empty
    ///
    /// This is the explicit way to turn a detach-for-move into a deletion: the
    /// object gets a fresh identifier when it is inserted again.
    pub fn reset_identifier(&mut self, object: ObjectRef) -> Result<()> {
        match object {
            ObjectRef::Component(key) => {
                let node = self.node(key)?;
                if node.is_attached() {
                    return Err(SimError::unsupported(format!(
                        "component '{}' must be detached before its identifier is reset",
                        node.name
                    )));
                }
                self.delete_subtree(key);
            }
            ObjectRef::Parameter(key) => self.check_detached_item(key)?,
            ObjectRef::Calculation(key) => self.check_detached_item(key)?,
            ObjectRef::Instance(key) => self.check_detached_item(key)?,
            ObjectRef::ChildEntry(_) | ObjectRef::Reference(_) => {
                return Err(SimError::unsupported(format!(
                    "{object:?} carries no identifier"
                )));
            }
        }
        let id = self.identifier_of(object);
        self.release_identity(object, id);
        self.set_identifier_of(object, Identifier::EMPTY);
        self.emit(ProjectEvent::PropertyChanged {
            object,
            property: Property::Identifier,
        });
        self.finish(())
    }

    fn check_detached_item<T: OwnedItem>(&self, key: Key<T>) -> Result<()> {
        let item = T::arena(self)
            .get(key)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown item {key:?}")))?;
        match item.owner() {
            Some(owner) => Err(SimError::unsupported(format!(
                "{key:?} is owned by {owner:?} and must be detached first"
            ))),
            None => Ok(()),
        }
    }

    /// Drop a deleted, detached component and everything it owns from storage
    ///
    /// Keys of dropped objects stop resolving. Components that still hold a
    /// located identifier anywhere in their subtree are rejected.
    pub fn dispose_component(&mut self, component: ComponentKey) -> Result<()> {
        let node = self.node(component)?;
        if node.is_attached() {
            return Err(SimError::unsupported(format!(
                "component '{}' is still attached",
                node.name
            )));
        }
        let subtree = self.subtree(component);
        for key in &subtree {
            let node = self.node(*key)?;
            let located = node.id.is_located()
                || node
                    .parameters
                    .iter()
                    .any(|p| self.identifier_of(p.into()).is_located())
                || node
                    .calculations
                    .iter()
                    .any(|c| self.identifier_of(c.into()).is_located())
                || node
                    .instances
                    .iter()
                    .any(|i| self.identifier_of(i.into()).is_located());
            if located {
                return Err(SimError::unsupported(format!(
                    "component '{}' is not deleted; reset its identifier first",
                    node.name
                )));
            }
        }

        for key in subtree {
            let Some(node) = self.components.remove(key) else {
                continue;
            };
            for entry in node.children.iter() {
                self.entries.remove(entry);
            }
            for parameter in node.parameters.iter() {
                self.parameters.remove(parameter);
            }
            for calculation in node.calculations.iter() {
                self.calculations.remove(calculation);
            }
            for instance in node.instances.iter() {
                self.instances.remove(instance);
            }
            for reference in node.references.iter() {
                self.unbind_reference(reference);
                self.references.remove(reference);
            }
        }
        debug!(?component, "Component disposed");
        Ok(())
    }
}
