//! Reference binding
//!
//! A reference is bound while it is owned and its target identifier resolves
//! in this project. Binding and unbinding are the only places that touch a
//! target's `referenced_by`.

use crate::events::{Property, ProjectEvent};
use crate::object::{CollectionRef, ComponentKey, ObjectRef, ReferenceKey};
use crate::project::Project;
use crate::reference::ComponentReference;
use crate::slots::Slot;
use simweave_core::{Identifier, Result, SimError, SimUser};
use tracing::{debug, trace};

impl Project {
    /// Create a detached reference to `target`
    pub fn create_reference(&mut self, slot: Slot, target: Option<ComponentKey>) -> Result<ReferenceKey> {
        let target_id = self.target_identifier(target)?;
        Ok(self
            .references
            .insert(ComponentReference::to_identifier(slot, target_id)))
    }

    /// Store a detached reference, typically an unresolved one built by a loader
    pub fn insert_reference(&mut self, reference: ComponentReference) -> ReferenceKey {
        self.references.insert(reference)
    }

    /// Point `reference` at `target`
    ///
    /// Only the owning component is checked and stamped; the target's profile
    /// is never consulted.
    pub fn set_reference_target(
        &mut self,
        user: &SimUser,
        reference: ReferenceKey,
        target: Option<ComponentKey>,
    ) -> Result<()> {
        let owner = self
            .references
            .get(reference)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown reference {reference:?}")))?
            .owner;
        let target_id = self.target_identifier(target)?;
        let guarded: Vec<ComponentKey> = owner.into_iter().collect();
        self.require_write(user, &guarded, "set reference target")?;
        let stamp = self.prepare_stamp(user, &guarded)?;

        self.unbind_reference(reference);
        if let Some(link) = self.references.get_mut(reference) {
            link.target_id = target_id;
        }
        self.bind_reference(reference);
        self.emit(ProjectEvent::PropertyChanged {
            object: reference.into(),
            property: Property::Target,
        });
        if let Some(owner) = owner {
            self.record_change(CollectionRef::References(owner), stamp.at());
        }
        self.apply_stamp(user, &stamp);
        debug!(?reference, ?target, user = user.name(), "Reference target set");
        self.finish(())
    }

    fn target_identifier(&self, target: Option<ComponentKey>) -> Result<Identifier> {
        let Some(target) = target else {
            return Ok(Identifier::EMPTY);
        };
        let node = self.node(target)?;
        if !node.id.is_located() {
            return Err(SimError::invalid_argument(format!(
                "component '{}' has no identifier and cannot be referenced",
                node.name
            )));
        }
        Ok(node.id)
    }

    /// Bind an unbound reference of a live owner whose target identifier resolves
    ///
    /// A reference whose target is not registered yet is parked until an object
    /// with that local id is attached.
    pub(crate) fn bind_reference(&mut self, reference: ReferenceKey) -> bool {
        let Some(link) = self.references.get(reference) else {
            return false;
        };
        let Some(owner) = link.owner else {
            return false;
        };
        if link.target.is_some() || link.target_id.is_empty() {
            return false;
        }
        // Deleted owners keep their references unbound
        if !self.components.get(owner).is_some_and(|node| node.id.is_located()) {
            return false;
        }
        // A target cleared by deletion stays cleared
        if self.ids.is_released(&link.target_id) {
            return false;
        }
        let target_id = link.target_id;
        let target = match self.ids.resolve(&target_id) {
            Some(ObjectRef::Component(target)) => target,
            Some(_) => return false,
            None => {
                self.park_reference(reference, &target_id);
                return false;
            }
        };
        let Some(node) = self.components.get_mut(target) else {
            return false;
        };
        if !node.referenced_by.contains(&reference) {
            node.referenced_by.push(reference);
        }
        let target_id = node.id;
        if let Some(link) = self.references.get_mut(reference) {
            link.target = Some(target);
            link.target_id = target_id;
        }
        trace!(?reference, ?target, "Reference bound");
        true
    }

    fn park_reference(&mut self, reference: ReferenceKey, target_id: &Identifier) {
        if target_id.global_id() != self.global_id() {
            return;
        }
        let waiting = self
            .pending_references
            .entry(target_id.local_id())
            .or_default();
        if !waiting.contains(&reference) {
            waiting.push(reference);
            trace!(?reference, local_id = target_id.local_id(), "Reference parked");
        }
    }

    /// Drop the forward and backward link of `reference`, keeping `target_id`
    pub(crate) fn unbind_reference(&mut self, reference: ReferenceKey) {
        let Some(target) = self
            .references
            .get_mut(reference)
            .and_then(|link| link.target.take())
        else {
            return;
        };
        if let Some(node) = self.components.get_mut(target) {
            node.referenced_by.retain(|r| *r != reference);
        }
        trace!(?reference, ?target, "Reference unbound");
    }

    /// Bind parked references waiting for any of `local_ids`
    ///
    /// Parked entries that went stale (owner removed, target changed, reference
    /// disposed) are dropped on the way.
    pub(crate) fn resolve_references_to(&mut self, local_ids: impl IntoIterator<Item = u64>) -> usize {
        let mut resolved = 0;
        for local_id in local_ids {
            let Some(waiting) = self.pending_references.shift_remove(&local_id) else {
                continue;
            };
            for reference in waiting {
                if self.bind_reference(reference) {
                    self.emit(ProjectEvent::PropertyChanged {
                        object: reference.into(),
                        property: Property::Target,
                    });
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Retry every parked reference
    pub(crate) fn resolve_pending_references(&mut self) -> usize {
        let local_ids: Vec<u64> = self.pending_references.keys().copied().collect();
        self.resolve_references_to(local_ids)
    }

    /// Number of references waiting for their target
    pub fn pending_reference_count(&self) -> usize {
        self.pending_references.values().map(Vec::len).sum()
    }
}
