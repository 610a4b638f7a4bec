//! Managed collection protocol
//!
//! Every mutating operation runs in two phases. The check phase validates
//! handles, ownership, identity, write access and the audit stamp without
//! touching anything. The commit phase then applies the change and cannot
//! fail. Notifications are queued during commit and delivered once the
//! operation returns, so a rejected call leaves no trace.

mod access;
mod children;
mod deletion;
mod owned;
mod references;
mod root;

pub use children::Destination;

use crate::component::ComponentNode;
use crate::object::{ComponentKey, ObjectRef};
use crate::project::Project;
use simweave_core::{AccessPrivilege, Identifier, Result, SimError, SimUser, Timestamp};
use std::collections::HashSet;
use tracing::warn;

/// How an item obtains its identifier on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityPlan {
    /// Already registered to the item in this project
    Keep(Identifier),
    /// Empty, released or stale outside loading: issue a fresh one
    Issue,
    /// Pre-assigned while loading: reserve it
    Reserve(Identifier),
}

/// Components whose write timestamp is stamped on commit
#[derive(Debug, Clone)]
pub(crate) struct Stamp {
    owners: Vec<ComponentKey>,
    at: Timestamp,
}

impl Stamp {
    pub(crate) fn at(&self) -> Timestamp {
        self.at
    }
}

impl Project {
    pub(crate) fn node(&self, key: ComponentKey) -> Result<&ComponentNode> {
        self.components
            .get(key)
            .ok_or_else(|| SimError::invalid_argument(format!("unknown component {key:?}")))
    }

    /// Require write access on every component in `guarded`
    pub(crate) fn require_write(
        &self,
        user: &SimUser,
        guarded: &[ComponentKey],
        operation: &str,
    ) -> Result<()> {
        for &key in guarded {
            let node = self.node(key)?;
            if !self.access_checking_enabled() {
                continue;
            }
            if !node.access.has_access(user.role(), AccessPrivilege::WRITE) {
                warn!(
                    user = user.name(),
                    role = %user.role(),
                    component = node.name.as_str(),
                    operation,
                    "Write access denied"
                );
                return Err(SimError::access_denied(format!(
                    "{} ({}) may not write component '{}' ({operation})",
                    user.name(),
                    user.role(),
                    node.name
                )));
            }
        }
        Ok(())
    }

    /// Validate the write stamps of `owners` for the acting role
    ///
    /// Stamping is skipped while access checking is suspended.
    pub(crate) fn prepare_stamp(&self, user: &SimUser, owners: &[ComponentKey]) -> Result<Stamp> {
        let at = self.now();
        let mut stamped = Vec::with_capacity(owners.len());
        if self.access_checking_enabled() {
            for &owner in owners {
                if stamped.contains(&owner) {
                    continue;
                }
                self.node(owner)?
                    .access
                    .check_timestamp(user.role(), AccessPrivilege::WRITE, at)?;
                stamped.push(owner);
            }
        }
        Ok(Stamp { owners: stamped, at })
    }

    pub(crate) fn apply_stamp(&mut self, user: &SimUser, stamp: &Stamp) {
        for &owner in &stamp.owners {
            let Some(node) = self.components.get_mut(owner) else {
                continue;
            };
            match node
                .access
                .set_timestamp(user.role(), AccessPrivilege::WRITE, stamp.at)
            {
                Ok(change) => self.events.emit(crate::events::ProjectEvent::AccessChanged {
                    component: owner,
                    change,
                }),
                Err(error) => warn!(%error, ?owner, "Validated write stamp was rejected"),
            }
        }
    }

    /// Decide how `object` carrying `id` is identified when inserted
    pub(crate) fn plan_identity(&self, object: ObjectRef, id: &Identifier) -> Result<IdentityPlan> {
        match id.location() {
            Some(location) if location != self.ids.location() => Err(SimError::unsupported(
                format!("identifier {id} belongs to {location}"),
            )),
            Some(_) if self.ids.is_registered_to(id, object) => Ok(IdentityPlan::Keep(*id)),
            Some(_) => {
                self.ids.check_reserve(object, id)?;
                Ok(IdentityPlan::Reserve(*id))
            }
            None if self.ids.is_released(id) => Ok(IdentityPlan::Issue),
            None if self.ids.is_loading() && !id.is_empty() => {
                self.ids.check_reserve(object, id)?;
                Ok(IdentityPlan::Reserve(*id))
            }
            None => Ok(IdentityPlan::Issue),
        }
    }

    pub(crate) fn apply_identity(&mut self, object: ObjectRef, plan: IdentityPlan) -> Identifier {
        let id = match plan {
            IdentityPlan::Keep(id) => id,
            IdentityPlan::Issue => self.ids.next_id(object),
            IdentityPlan::Reserve(id) => match self.ids.reserve(object, &id) {
                Ok(id) => id,
                Err(error) => {
                    warn!(%error, ?object, "Validated reservation was rejected, issuing a fresh id");
                    self.ids.next_id(object)
                }
            },
        };
        self.set_identifier_of(object, id);
        id
    }

    /// `root` and every component below it, parents first
    pub(crate) fn subtree(&self, root: ComponentKey) -> Vec<ComponentKey> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.components.get(key) else {
                continue;
            };
            order.push(key);
            let children = node
                .children
                .iter()
                .filter_map(|entry| self.entries.get(entry).and_then(|e| e.component));
            let mut children: Vec<_> = children.collect();
            children.reverse();
            stack.extend(children);
        }
        order
    }

    /// Identity plans for every identified object of the subtree at `root`
    pub(crate) fn plan_subtree(&self, root: ComponentKey) -> Result<Vec<(ObjectRef, IdentityPlan)>> {
        let mut plans = Vec::new();
        let mut reserved = HashSet::new();
        for key in self.subtree(root) {
            let node = self.node(key)?;
            let mut objects: Vec<ObjectRef> = vec![key.into()];
            objects.extend(node.parameters.iter().map(ObjectRef::from));
            objects.extend(node.calculations.iter().map(ObjectRef::from));
            objects.extend(node.instances.iter().map(ObjectRef::from));
            for object in objects {
                let plan = self.plan_identity(object, &self.identifier_of(object))?;
                if let IdentityPlan::Reserve(id) = plan {
                    if !reserved.insert(id.local_id()) {
                        return Err(SimError::duplicate(format!(
                            "identifier {id} is claimed twice in the inserted subtree"
                        )));
                    }
                }
                plans.push((object, plan));
            }
        }
        Ok(plans)
    }

    /// Apply identity plans, re-bind outbound references of the subtree and
    /// resolve references that were waiting for one of its objects
    pub(crate) fn attach_subtree(&mut self, root: ComponentKey, plans: Vec<(ObjectRef, IdentityPlan)>) {
        let mut arrived = Vec::new();
        for (object, plan) in plans {
            let id = self.apply_identity(object, plan);
            if matches!(object, ObjectRef::Component(_)) {
                arrived.push(id.local_id());
            }
        }
        for key in self.subtree(root) {
            let outbound: Vec<_> = self
                .components
                .get(key)
                .map(|node| node.references.iter().collect())
                .unwrap_or_default();
            for reference in outbound {
                self.bind_reference(reference);
            }
        }
        self.resolve_references_to(arrived);
    }

    /// True if `candidate` is `of` or one of its ancestors
    pub(crate) fn is_ancestor_or_self(&self, candidate: ComponentKey, of: ComponentKey) -> bool {
        let mut current = Some(of);
        while let Some(key) = current {
            if key == candidate {
                return true;
            }
            current = self.components.get(key).and_then(|node| node.parent);
        }
        false
    }
}

/// Append `extra` to `guarded`, skipping duplicates
pub(crate) fn guard_list(
    guarded: impl IntoIterator<Item = ComponentKey>,
    extra: impl IntoIterator<Item = Option<ComponentKey>>,
) -> Vec<ComponentKey> {
    let mut list: Vec<ComponentKey> = Vec::new();
    for key in guarded.into_iter().chain(extra.into_iter().flatten()) {
        if !list.contains(&key) {
            list.push(key);
        }
    }
    list
}
