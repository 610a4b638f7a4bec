//! Parameters, calculations, instances and references
//!
//! These collections share one implementation over [`OwnedItem`]. Only the
//! owning component is checked and stamped. Reference items additionally keep
//! their target's `referenced_by` list in sync.

use super::{guard_list, IdentityPlan};
use crate::events::{CollectionChange, Property, ProjectEvent, RemovedItem};
use crate::items::OwnedItem;
use crate::object::{ComponentKey, ObjectRef};
use crate::project::Project;
use crate::store::Key;
use simweave_core::{Identifier, Result, SimError, SimUser};
use tracing::debug;

impl Project {
    /// Add a detached item to the matching collection of `owner`
    pub fn add_item<T: OwnedItem>(&mut self, user: &SimUser, owner: ComponentKey, item: Key<T>) -> Result<()> {
        let plan = self.check_item_insert(owner, item)?;
        self.require_write(user, &[owner], "add item")?;
        let stamp = self.prepare_stamp(user, &[owner])?;

        self.attach_item(owner, item, plan);
        if let Some(node) = self.components.get_mut(owner) {
            T::collection_mut(node).push(item);
        }
        let collection = T::KIND.of(owner);
        self.record_change(collection, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection,
            change: CollectionChange::Added(vec![T::object(item)]),
        });
        self.apply_stamp(user, &stamp);
        debug!(?owner, ?item, user = user.name(), "Item added");
        self.finish(())
    }

    /// Remove an item from `owner` and delete it
    pub fn remove_item<T: OwnedItem>(&mut self, user: &SimUser, owner: ComponentKey, item: Key<T>) -> Result<()> {
        self.remove_owned(user, owner, item, true)
    }

    /// Remove an item from `owner`, keeping its identifier for a later re-insert
    pub fn remove_item_without_delete<T: OwnedItem>(
        &mut self,
        user: &SimUser,
        owner: ComponentKey,
        item: Key<T>,
    ) -> Result<()> {
        self.remove_owned(user, owner, item, false)
    }

    /// Replace the item at `index` of `owner`'s collection; returns the replaced item
    pub fn replace_item<T: OwnedItem>(
        &mut self,
        user: &SimUser,
        owner: ComponentKey,
        index: usize,
        item: Key<T>,
    ) -> Result<Key<T>> {
        let old = T::collection(self.node(owner)?)
            .get(index)
            .ok_or_else(|| SimError::not_found(format!("no item at index {index}")))?;
        if old == item {
            return Ok(old);
        }
        let plan = self.check_item_insert(owner, item)?;
        self.require_write(user, &[owner], "replace item")?;
        let stamp = self.prepare_stamp(user, &[owner])?;

        let removed = self.detach_item(old);
        self.attach_item(owner, item, plan);
        if let Some(node) = self.components.get_mut(owner) {
            T::collection_mut(node).replace(index, item);
        }
        let collection = T::KIND.of(owner);
        self.record_change(collection, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection,
            change: CollectionChange::Replaced {
                old: removed,
                new: T::object(item),
            },
        });
        self.apply_stamp(user, &stamp);
        self.release_identity(removed.object, removed.identifier);
        debug!(?owner, ?old, ?item, user = user.name(), "Item replaced");
        self.finish(old)
    }

    /// Delete every item of `owner`'s collection of type `T`
    pub fn clear_items<T: OwnedItem>(&mut self, user: &SimUser, owner: ComponentKey) -> Result<()> {
        let items = T::collection(self.node(owner)?).items().to_vec();
        if items.is_empty() {
            return Ok(());
        }
        self.require_write(user, &[owner], "clear items")?;
        let stamp = self.prepare_stamp(user, &[owner])?;

        if let Some(node) = self.components.get_mut(owner) {
            T::collection_mut(node).take_all();
        }
        let removed: Vec<RemovedItem> = items.iter().map(|item| self.detach_item(*item)).collect();
        let collection = T::KIND.of(owner);
        self.record_change(collection, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection,
            change: CollectionChange::Reset(removed.clone()),
        });
        self.apply_stamp(user, &stamp);
        for item in removed {
            self.release_identity(item.object, item.identifier);
        }
        debug!(?owner, count = items.len(), user = user.name(), "Items cleared");
        self.finish(())
    }

    /// Move an owned item to another component, keeping its identifier
    pub fn move_item<T: OwnedItem>(&mut self, user: &SimUser, item: Key<T>, new_owner: ComponentKey) -> Result<()> {
        let value = T::arena(self)
            .get(item)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown item {item:?}")))?;
        let current = value.owner();
        self.node(new_owner)?;
        if current == Some(new_owner) {
            return Err(SimError::duplicate(format!(
                "{item:?} is already owned by {new_owner:?}"
            )));
        }
        let plan = if T::IDENTIFIED {
            Some(self.plan_identity(T::object(item), &value.identifier())?)
        } else {
            None
        };
        let guarded = guard_list([new_owner], [current]);
        self.require_write(user, &guarded, "move item")?;
        let stamp = self.prepare_stamp(user, &guarded)?;

        if let Some(old_owner) = current {
            if let Some(node) = self.components.get_mut(old_owner) {
                T::collection_mut(node).remove(item);
            }
            let removed = self.detach_item(item);
            let collection = T::KIND.of(old_owner);
            self.record_change(collection, stamp.at());
            self.emit(ProjectEvent::CollectionChanged {
                collection,
                change: CollectionChange::Removed(vec![removed]),
            });
        }
        self.attach_item(new_owner, item, plan);
        if let Some(node) = self.components.get_mut(new_owner) {
            T::collection_mut(node).push(item);
        }
        let collection = T::KIND.of(new_owner);
        self.record_change(collection, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection,
            change: CollectionChange::Added(vec![T::object(item)]),
        });
        self.apply_stamp(user, &stamp);
        debug!(?item, ?new_owner, user = user.name(), "Item moved");
        self.finish(())
    }

    fn remove_owned<T: OwnedItem>(
        &mut self,
        user: &SimUser,
        owner: ComponentKey,
        item: Key<T>,
        delete: bool,
    ) -> Result<()> {
        let node = self.node(owner)?;
        if !T::collection(node).contains(item) {
            return Err(SimError::not_found(format!(
                "{item:?} is not owned by '{}'",
                node.name
            )));
        }
        self.require_write(user, &[owner], "remove item")?;
        let stamp = self.prepare_stamp(user, &[owner])?;

        if let Some(node) = self.components.get_mut(owner) {
            T::collection_mut(node).remove(item);
        }
        let removed = self.detach_item(item);
        let collection = T::KIND.of(owner);
        self.record_change(collection, stamp.at());
        self.emit(ProjectEvent::CollectionChanged {
            collection,
            change: CollectionChange::Removed(vec![removed]),
        });
        self.apply_stamp(user, &stamp);
        if delete {
            self.release_identity(removed.object, removed.identifier);
        }
        debug!(?owner, ?item, delete, user = user.name(), "Item removed");
        self.finish(())
    }

    fn check_item_insert<T: OwnedItem>(&self, owner: ComponentKey, item: Key<T>) -> Result<Option<IdentityPlan>> {
        self.node(owner)?;
        let value = T::arena(self)
            .get(item)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown item {item:?}")))?;
        match value.owner() {
            Some(current) if current == owner => {
                return Err(SimError::duplicate(format!(
                    "{item:?} is already owned by {owner:?}"
                )));
            }
            Some(current) => {
                return Err(SimError::unsupported(format!(
                    "{item:?} is owned by {current:?}"
                )));
            }
            None => {}
        }
        if T::IDENTIFIED {
            Ok(Some(self.plan_identity(T::object(item), &value.identifier())?))
        } else {
            Ok(None)
        }
    }

    fn attach_item<T: OwnedItem>(&mut self, owner: ComponentKey, item: Key<T>, plan: Option<IdentityPlan>) {
        let object = T::object(item);
        if let Some(plan) = plan {
            self.apply_identity(object, plan);
        }
        if let Some(value) = T::arena_mut(self).get_mut(item) {
            value.set_owner(Some(owner));
        }
        if let ObjectRef::Reference(reference) = object {
            self.bind_reference(reference);
        }
        self.emit(ProjectEvent::PropertyChanged {
            object,
            property: Property::Factory,
        });
    }

    /// Unwire an item; identifier release is left to the caller
    fn detach_item<T: OwnedItem>(&mut self, item: Key<T>) -> RemovedItem {
        let object = T::object(item);
        if let ObjectRef::Reference(reference) = object {
            self.unbind_reference(reference);
        }
        let identifier = match T::arena_mut(self).get_mut(item) {
            Some(value) => {
                value.set_owner(None);
                value.identifier()
            }
            None => Identifier::EMPTY,
        };
        self.emit(ProjectEvent::PropertyChanged {
            object,
            property: Property::Factory,
        });
        RemovedItem { object, identifier }
    }
}
