//! Structural consistency checks
//!
//! The protocol keeps these invariants on every committed operation. The
//! checker walks the whole project and reports every violation it finds, which
//! makes it the oracle for property tests and a cheap assertion for loaders.

use crate::items::OwnedItem;
use crate::object::{CollectionRef, ComponentKey, ObjectRef};
use crate::project::Project;
use std::collections::HashSet;

impl Project {
    /// Describe every broken structural invariant; empty when consistent
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut located = 0usize;

        for component in self.root.iter() {
            match self.components.get(component) {
                Some(node) if node.factory == Some(CollectionRef::Root) && node.parent.is_none() => {}
                Some(node) => violations.push(format!(
                    "root component '{}' has factory {:?} and parent {:?}",
                    node.name, node.factory, node.parent
                )),
                None => violations.push(format!("root collection holds unknown {component:?}")),
            }
        }

        for (key, node) in self.components.iter() {
            if node.id.is_located() {
                located += 1;
                if self.ids.resolve(&node.id) != Some(ObjectRef::Component(key)) {
                    violations.push(format!(
                        "component '{}' holds unregistered identifier {}",
                        node.name, node.id
                    ));
                }
            }
            match (node.factory, node.parent, node.parent_container) {
                (Some(CollectionRef::Root), None, None) => {
                    if !self.root.contains(key) {
                        violations.push(format!("component '{}' is missing from the root", node.name));
                    }
                }
                (Some(CollectionRef::Children(parent)), Some(p), Some(entry)) if parent == p => {
                    match self.entries.get(entry) {
                        Some(slot) if slot.parent == Some(parent) && slot.component == Some(key) => {
                            if slot.slot.base() != &node.current_slot {
                                violations.push(format!(
                                    "component '{}' sits in slot {} but claims {}",
                                    node.name, slot.slot, node.current_slot
                                ));
                            }
                        }
                        _ => violations.push(format!(
                            "component '{}' points at an entry that does not hold it",
                            node.name
                        )),
                    }
                }
                (None, None, None) => {}
                (factory, parent, entry) => violations.push(format!(
                    "component '{}' has inconsistent links: factory {factory:?}, parent {parent:?}, entry {entry:?}",
                    node.name
                )),
            }
            self.check_children(key, &mut violations);

            located += self.check_items::<crate::items::Parameter>(key, &mut violations);
            located += self.check_items::<crate::items::Calculation>(key, &mut violations);
            located += self.check_items::<crate::items::Instance>(key, &mut violations);
            self.check_items::<crate::reference::ComponentReference>(key, &mut violations);

            for reference in &node.referenced_by {
                let bound = self
                    .references
                    .get(*reference)
                    .is_some_and(|link| link.target == Some(key));
                if !bound {
                    violations.push(format!(
                        "component '{}' lists {reference:?} which does not target it",
                        node.name
                    ));
                }
            }
        }

        for (key, link) in self.references.iter() {
            let Some(target) = link.target else {
                continue;
            };
            match self.components.get(target) {
                Some(node) if node.referenced_by.contains(&key) && link.target_id.same_id(&node.id) => {}
                _ => violations.push(format!("{key:?} is not mirrored by its target {target:?}")),
            }
        }

        // Detached items with located ids are allowed between a remove without
        // delete and the next insert; they still count against the registry.
        located += self.detached_located::<crate::items::Parameter>();
        located += self.detached_located::<crate::items::Calculation>();
        located += self.detached_located::<crate::items::Instance>();
        if located != self.ids.len() {
            violations.push(format!(
                "{located} objects hold located identifiers but {} are registered",
                self.ids.len()
            ));
        }
        violations
    }

    fn check_children(&self, parent: ComponentKey, violations: &mut Vec<String>) {
        let Some(node) = self.components.get(parent) else {
            return;
        };
        let mut bases = HashSet::new();
        for entry in node.children.iter() {
            let Some(slot) = self.entries.get(entry) else {
                violations.push(format!("'{}' lists unknown {entry:?}", node.name));
                continue;
            };
            if slot.parent != Some(parent) {
                violations.push(format!("{entry:?} of '{}' names another parent", node.name));
            }
            if !bases.insert(slot.slot.clone()) {
                violations.push(format!("slot {} is used twice in '{}'", slot.slot, node.name));
            }
            if let Some(child) = slot.component {
                let attached = self
                    .components
                    .get(child)
                    .is_some_and(|c| c.parent == Some(parent) && c.parent_container == Some(entry));
                if !attached {
                    violations.push(format!("{entry:?} of '{}' holds a foreign child", node.name));
                }
            }
        }
    }

    /// Owner consistency of `owner`'s items of type `T`; returns located ids seen
    fn check_items<T: OwnedItem>(&self, owner: ComponentKey, violations: &mut Vec<String>) -> usize {
        let Some(node) = self.components.get(owner) else {
            return 0;
        };
        let mut located = 0;
        for item in T::collection(node).iter() {
            let Some(value) = T::arena(self).get(item) else {
                violations.push(format!("'{}' lists unknown {item:?}", node.name));
                continue;
            };
            if value.owner() != Some(owner) {
                violations.push(format!("{item:?} listed by '{}' names another owner", node.name));
            }
            let id = value.identifier();
            if id.is_located() {
                located += 1;
                if self.ids.resolve(&id) != Some(T::object(item)) {
                    violations.push(format!("{item:?} holds unregistered identifier {id}"));
                }
            }
        }
        located
    }

    fn detached_located<T: OwnedItem>(&self) -> usize {
        T::arena(self)
            .iter()
            .filter(|(_, item)| item.owner().is_none() && item.identifier().is_located())
            .count()
    }
}
