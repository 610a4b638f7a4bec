//! Random operation sequences never break structural integrity, whatever
//! mix of successes and rejections they produce.

#![allow(clippy::unwrap_used)]

mod common;

use common::{project, slot};
use proptest::prelude::*;
use simweave_components::{ComponentKey, Destination, Parameter, Project};
use simweave_core::test_utils::{admin, architect};
use simweave_core::{SimUser, SimUserRole};

const POOL: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    AddRoot(usize),
    RemoveRoot(usize),
    DetachRoot(usize),
    AddChild(usize, usize, u8),
    RemoveChild(usize, usize),
    DetachChild(usize, usize),
    ClearChildren(usize),
    MoveToRoot(usize),
    MoveUnder(usize, usize, u8),
    AddParameter(usize),
    ClearParameters(usize),
    AddReference(usize, usize),
    ResetIdentifier(usize),
    Dispose(usize),
    ClearRoot,
}

fn any_op() -> impl Strategy<Value = Op> {
    let index = 0..POOL;
    prop_oneof![
        index.clone().prop_map(Op::AddRoot),
        index.clone().prop_map(Op::RemoveRoot),
        index.clone().prop_map(Op::DetachRoot),
        (index.clone(), index.clone(), 0u8..3).prop_map(|(p, c, s)| Op::AddChild(p, c, s)),
        (index.clone(), 0usize..3).prop_map(|(p, i)| Op::RemoveChild(p, i)),
        (index.clone(), 0usize..3).prop_map(|(p, i)| Op::DetachChild(p, i)),
        index.clone().prop_map(Op::ClearChildren),
        index.clone().prop_map(Op::MoveToRoot),
        (index.clone(), index.clone(), 0u8..3).prop_map(|(c, p, s)| Op::MoveUnder(c, p, s)),
        index.clone().prop_map(Op::AddParameter),
        index.clone().prop_map(Op::ClearParameters),
        (index.clone(), index.clone()).prop_map(|(o, t)| Op::AddReference(o, t)),
        index.clone().prop_map(Op::ResetIdentifier),
        index.prop_map(Op::Dispose),
        Just(Op::ClearRoot),
    ]
}

fn any_user() -> impl Strategy<Value = SimUser> {
    prop_oneof![Just(admin()), Just(architect())]
}

fn apply(project: &mut Project, pool: &[ComponentKey], user: &SimUser, op: &Op) {
    let child_at = |project: &Project, parent: ComponentKey, index: usize| {
        project
            .component(parent)
            .and_then(|node| node.children().get(index))
    };
    // Rejections are part of the exercise; only the resulting state matters.
    let _ = match *op {
        Op::AddRoot(c) => project.add_component(user, pool[c]),
        Op::RemoveRoot(c) => project.remove_component(user, pool[c]),
        Op::DetachRoot(c) => project.remove_component_without_delete(user, pool[c]),
        Op::AddChild(p, c, s) => {
            let slot = slot(project, &s.to_string());
            project.add_child(user, pool[p], slot, Some(pool[c])).map(|_| ())
        }
        Op::RemoveChild(p, i) => match child_at(project, pool[p], i) {
            Some(entry) => project.remove_child(user, pool[p], entry),
            None => Ok(()),
        },
        Op::DetachChild(p, i) => match child_at(project, pool[p], i) {
            Some(entry) => project
                .remove_child_without_delete(user, pool[p], entry)
                .map(|_| ()),
            None => Ok(()),
        },
        Op::ClearChildren(p) => project.clear_children(user, pool[p]),
        Op::MoveToRoot(c) => project
            .move_component(user, pool[c], Destination::Root)
            .map(|_| ()),
        Op::MoveUnder(c, p, s) => {
            let destination = Destination::Child {
                parent: pool[p],
                slot: slot(project, &s.to_string()),
            };
            project.move_component(user, pool[c], destination).map(|_| ())
        }
        Op::AddParameter(c) => {
            let parameter = project.insert_item(Parameter::new("p", "", 1.0));
            project.add_item(user, pool[c], parameter)
        }
        Op::ClearParameters(c) => project.clear_items::<Parameter>(user, pool[c]),
        Op::AddReference(o, t) => {
            let slot = slot(project, "ref");
            project
                .create_reference(slot, Some(pool[t]))
                .and_then(|reference| project.add_item(user, pool[o], reference))
        }
        Op::ResetIdentifier(c) => project.reset_identifier(pool[c].into()),
        Op::Dispose(c) => project.dispose_component(pool[c]),
        Op::ClearRoot => project.clear_components(user),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_keep_the_graph_consistent(
        ops in prop::collection::vec((any_user(), any_op()), 1..40),
    ) {
        let (mut project, clock) = project();
        let pool: Vec<ComponentKey> = (0..POOL)
            .map(|i| {
                let creator = if i % 2 == 0 {
                    SimUserRole::Architecture
                } else {
                    SimUserRole::Administrator
                };
                let slot = project.default_slot();
                project.create_component_as(format!("c{i}"), creator, slot)
            })
            .collect();

        for (user, op) in &ops {
            clock.advance_secs(1);
            apply(&mut project, &pool, user, op);
            let violations = project.integrity_violations();
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
        }
    }
}
