//! Managed collection protocol: identity, deletion, access checks and change
//! tracking across root components and owned items.

#![allow(clippy::unwrap_used)]

mod common;

use assert_matches::assert_matches;
use common::{component, project, slot, Recorder};
use simweave_components::{
    CollectionChange, CollectionRef, ComponentNode, OwnedItem, Parameter, ProjectEvent,
    RemovedItem,
};
use simweave_core::test_utils::{admin, architect, guest, ts};
use simweave_core::{
    AccessPrivilege, EntryProperty, Identifier, SimError, SimUserRole, EPOCH_MIN,
};

#[test]
fn add_then_remove_releases_every_identifier() {
    let (mut project, clock) = project();
    let recorder = Recorder::attach(&mut project);
    let architect = architect();

    let wall = component(&mut project, "Wall", SimUserRole::Architecture);
    project.add_component(&architect, wall).unwrap();
    let wall_id = *project.component(wall).unwrap().id();
    assert!(wall_id.is_located());
    assert_eq!(project.get_by_id(&wall_id), Some(wall));
    assert_eq!(project.component(wall).unwrap().factory(), Some(CollectionRef::Root));
    assert_eq!(project.changes(CollectionRef::Root).unwrap().last_change(), ts(0));

    clock.advance_secs(5);
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&architect, wall, width).unwrap();
    let width_id = *project.item(width).unwrap().id();
    assert!(width_id.is_located());
    assert_eq!(project.item(width).unwrap().owner(), Some(wall));
    let node = project.component(wall).unwrap();
    assert_eq!(node.parameters().last_change(), ts(5));
    assert_eq!(node.access_profile()[SimUserRole::Architecture].last_write(), ts(5));
    assert_eq!(project.identified_count(), 2);

    clock.advance_secs(5);
    recorder.clear();
    project.remove_component(&architect, wall).unwrap();

    assert!(project.root_components().is_empty());
    assert_eq!(project.identified_count(), 0);
    assert_eq!(recorder.deletions(), 2);
    let node = project.component(wall).unwrap();
    assert!(!node.id().is_located());
    assert_eq!(node.id().local_id(), wall_id.local_id());
    assert_eq!(project.item(width).unwrap().id().local_id(), width_id.local_id());
    assert_eq!(project.get_by_id::<ComponentNode>(&wall_id), None);
    // root removal does not stamp the removed component
    assert_eq!(node.access_profile()[SimUserRole::Architecture].last_write(), ts(5));
    assert!(project.integrity_violations().is_empty());
}

#[test]
fn removal_event_carries_identifier_before_release() {
    let (mut project, _clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&admin, wall, width).unwrap();
    let width_id = *project.item(width).unwrap().id();

    let recorder = Recorder::attach(&mut project);
    project.remove_item(&admin, wall, width).unwrap();

    let removal = recorder.events().into_iter().find_map(|event| match event {
        ProjectEvent::CollectionChanged {
            change: CollectionChange::Removed(items),
            ..
        } => Some(items),
        _ => None,
    });
    assert_eq!(
        removal,
        Some(vec![RemovedItem {
            object: width.into(),
            identifier: width_id,
        }])
    );
    assert!(!project.item(width).unwrap().id().is_located());
}

#[test]
fn move_keeps_identifier_unless_reset() {
    let (mut project, _clock) = project();
    let recorder = Recorder::attach(&mut project);
    let admin = admin();

    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    let original = *project.component(wall).unwrap().id();

    project.remove_component_without_delete(&admin, wall).unwrap();
    assert_eq!(*project.component(wall).unwrap().id(), original);
    assert_eq!(project.get_by_id(&original), Some(wall));
    project.add_component(&admin, wall).unwrap();
    assert_eq!(*project.component(wall).unwrap().id(), original);
    assert_eq!(recorder.deletions(), 0);

    project.remove_component_without_delete(&admin, wall).unwrap();
    project.reset_identifier(wall.into()).unwrap();
    assert_eq!(recorder.deletions(), 1);
    assert_eq!(*project.component(wall).unwrap().id(), Identifier::EMPTY);

    project.add_component(&admin, wall).unwrap();
    let reissued = *project.component(wall).unwrap().id();
    assert!(reissued.is_located());
    assert_ne!(reissued.local_id(), original.local_id());
    assert_eq!(recorder.deletions(), 1);
    assert!(project.integrity_violations().is_empty());
}

#[test]
fn reset_identifier_requires_detached_object() {
    let (mut project, _clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    let result = project.reset_identifier(wall.into());
    assert_matches!(result, Err(SimError::UnsupportedOperation { .. }));
    assert!(project.component(wall).unwrap().id().is_located());
}

#[test]
fn clear_is_all_or_nothing() {
    let (mut project, clock) = project();
    let admin = admin();
    let architect = architect();

    let own = component(&mut project, "Own", SimUserRole::Architecture);
    let foreign = component(&mut project, "Foreign", SimUserRole::FireSafety);
    project.add_component(&architect, own).unwrap();
    project.add_component(&admin, foreign).unwrap();
    let root_change = project.changes(CollectionRef::Root).unwrap().last_change();

    clock.advance_secs(30);
    let recorder = Recorder::attach(&mut project);
    let result = project.clear_components(&architect);
    assert_matches!(result, Err(SimError::AccessDenied { .. }));

    assert_eq!(project.root_components().len(), 2);
    assert_eq!(project.identified_count(), 2);
    assert!(recorder.events().is_empty());
    assert_eq!(project.changes(CollectionRef::Root).unwrap().last_change(), root_change);
    assert_eq!(
        project.component(own).unwrap().access_profile()[SimUserRole::Architecture].last_write(),
        ts(0)
    );

    project.clear_components(&admin).unwrap();
    assert!(project.root_components().is_empty());
    assert_eq!(project.identified_count(), 0);
    assert_eq!(recorder.deletions(), 2);
    let resets: Vec<_> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ProjectEvent::CollectionChanged {
                collection: CollectionRef::Root,
                change: CollectionChange::Reset(items),
            } => Some(items.len()),
            _ => None,
        })
        .collect();
    assert_eq!(resets, vec![2]);
}

#[test]
fn denied_insert_leaves_no_trace() {
    let (mut project, _clock) = project();
    let recorder = Recorder::attach(&mut project);
    let wall = component(&mut project, "Wall", SimUserRole::Architecture);

    let result = project.add_component(&guest(), wall);
    assert_matches!(result, Err(SimError::AccessDenied { .. }));
    assert!(project.root_components().is_empty());
    assert!(!project.changes(CollectionRef::Root).unwrap().has_changes());
    assert_eq!(*project.component(wall).unwrap().id(), Identifier::EMPTY);
    assert_eq!(project.component(wall).unwrap().factory(), None);
    assert_eq!(project.identified_count(), 0);
    assert!(recorder.events().is_empty());
}

#[test]
fn denied_item_insert_leaves_owner_unstamped() {
    let (mut project, clock) = project();
    let architect = architect();
    let wall = component(&mut project, "Wall", SimUserRole::Architecture);
    project.add_component(&architect, wall).unwrap();

    clock.advance_secs(10);
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    let result = project.add_item(&guest(), wall, width);
    assert_matches!(result, Err(SimError::AccessDenied { .. }));
    let node = project.component(wall).unwrap();
    assert!(node.parameters().is_empty());
    assert!(!node.parameters().has_changes());
    assert_eq!(node.parameters().last_change(), EPOCH_MIN);
    assert_eq!(node.access_profile()[SimUserRole::Guest].last_write(), EPOCH_MIN);
    assert_eq!(project.item(width).unwrap().owner(), None);
}

#[test]
fn duplicate_and_foreign_insertion_are_rejected() {
    let (mut project, _clock) = project();
    let admin = admin();
    let first = project.create_component("First");
    let second = project.create_component("Second");
    project.add_component(&admin, first).unwrap();
    project.add_component(&admin, second).unwrap();

    assert_matches!(
        project.add_component(&admin, first),
        Err(SimError::DuplicateInsertion { .. })
    );

    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&admin, first, width).unwrap();
    assert_matches!(
        project.add_item(&admin, first, width),
        Err(SimError::DuplicateInsertion { .. })
    );
    assert_matches!(
        project.add_item(&admin, second, width),
        Err(SimError::UnsupportedOperation { .. })
    );
    assert_eq!(project.item(width).unwrap().owner(), Some(first));
}

#[test]
fn identifier_registered_elsewhere_is_not_reused() {
    let (mut project, _clock) = project();
    let admin = admin();
    let first = project.create_component("First");
    project.add_component(&admin, first).unwrap();
    let taken = *project.component(first).unwrap().id();

    let copy = project.insert_component(
        ComponentNode::new(
            "Copy",
            SimUserRole::Administrator,
            project.default_slot(),
        )
        .with_identifier(taken),
    );
    assert_matches!(
        project.add_component(&admin, copy),
        Err(SimError::UnsupportedOperation { .. })
    );
    assert!(project.component(copy).unwrap().factory().is_none());
}

#[test]
fn replace_raises_a_single_structural_change() {
    let (mut project, _clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    let depth = project.insert_item(Parameter::new("depth", "m", 0.2));
    project.add_item(&admin, wall, width).unwrap();

    let recorder = Recorder::attach(&mut project);
    let replaced = project.replace_item(&admin, wall, 0, depth).unwrap();
    assert_eq!(replaced, width);
    assert_eq!(recorder.collection_changes(), 1);
    assert_eq!(recorder.deletions(), 1);
    assert_eq!(project.component(wall).unwrap().parameters().items(), &[depth]);
    assert!(project.item(depth).unwrap().id().is_located());
    assert!(!project.item(width).unwrap().id().is_located());

    assert_matches!(
        project.replace_item(&admin, wall, 3, width),
        Err(SimError::NotFound { .. })
    );
}

#[test]
fn move_item_keeps_identifier_and_stamps_both_owners() {
    let (mut project, clock) = project();
    let admin = admin();
    let architect = architect();
    let from = component(&mut project, "From", SimUserRole::Architecture);
    let to = component(&mut project, "To", SimUserRole::Architecture);
    project.add_component(&architect, from).unwrap();
    project.add_component(&architect, to).unwrap();
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&architect, from, width).unwrap();
    let id = *project.item(width).unwrap().id();

    clock.advance_secs(20);
    let recorder = Recorder::attach(&mut project);
    project.move_item(&architect, width, to).unwrap();

    assert_eq!(*project.item(width).unwrap().id(), id);
    assert_eq!(project.item(width).unwrap().owner(), Some(to));
    assert_eq!(recorder.deletions(), 0);
    for owner in [from, to] {
        let profile = project.component(owner).unwrap().access_profile();
        assert_eq!(profile[SimUserRole::Architecture].last_write(), ts(20));
    }

    let locked = project.create_component("Locked");
    project.add_component(&admin, locked).unwrap();
    assert_matches!(
        project.move_item(&architect, width, locked),
        Err(SimError::AccessDenied { .. })
    );
    assert_eq!(project.item(width).unwrap().owner(), Some(to));
}

#[test]
fn reset_changes_clears_the_flag_only() {
    let (mut project, _clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    assert!(project.changes(CollectionRef::Root).unwrap().has_changes());

    project.reset_changes(CollectionRef::Root).unwrap();
    assert!(!project.changes(CollectionRef::Root).unwrap().has_changes());
    assert_eq!(project.root_components().len(), 1);
}

#[test]
fn disabled_scope_skips_checks_and_stamps() {
    let (mut project, _clock) = project();
    let wall = component(&mut project, "Wall", SimUserRole::Architecture);
    let guest = guest();

    project
        .with_access_checking_disabled(|p| p.add_component(&guest, wall))
        .unwrap();
    assert_eq!(project.root_components().len(), 1);
    let profile = project.component(wall).unwrap().access_profile();
    assert_eq!(profile[SimUserRole::Guest].last_write(), EPOCH_MIN);
    assert_eq!(profile.effective_access(SimUserRole::Guest), AccessPrivilege::NONE);

    // duplicate insertion is still enforced inside the scope
    project.disable_access_checking();
    assert_matches!(
        project.add_component(&guest, wall),
        Err(SimError::DuplicateInsertion { .. })
    );
    project.enable_access_checking().unwrap();
    assert!(project.access_checking_enabled());
}

#[test]
fn dispose_drops_deleted_components_only() {
    let (mut project, _clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    project.add_component(&admin, wall).unwrap();
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&admin, wall, width).unwrap();

    project.remove_component_without_delete(&admin, wall).unwrap();
    assert_matches!(
        project.dispose_component(wall),
        Err(SimError::UnsupportedOperation { .. })
    );

    project.reset_identifier(wall.into()).unwrap();
    project.dispose_component(wall).unwrap();
    assert!(project.component(wall).is_none());
    assert!(project.item(width).is_none());
    assert!(project.integrity_violations().is_empty());
}

#[test]
fn replace_component_deletes_the_old_subtree() {
    let (mut project, _clock) = project();
    let admin = admin();
    let old = project.create_component("Old");
    let child = project.create_component("Child");
    project.add_component(&admin, old).unwrap();
    project
        .add_child(&admin, old, slot(&project, "0"), Some(child))
        .unwrap();
    let old_id = *project.component(old).unwrap().id();
    let new = project.create_component("New");

    let recorder = Recorder::attach(&mut project);
    assert_eq!(project.replace_component(&admin, 0, new).unwrap(), old);

    assert_eq!(project.root_components().items(), &[new]);
    assert_eq!(recorder.collection_changes(), 1);
    let replaced = recorder.events().into_iter().find_map(|event| match event {
        ProjectEvent::CollectionChanged {
            collection: CollectionRef::Root,
            change: CollectionChange::Replaced { old: removed, new: added },
        } => Some((removed, added)),
        _ => None,
    });
    assert_eq!(
        replaced,
        Some((
            RemovedItem {
                object: old.into(),
                identifier: old_id,
            },
            new.into()
        ))
    );
    assert_eq!(recorder.deletions(), 2);
    assert!(!project.component(old).unwrap().id().is_located());
    assert!(!project.component(child).unwrap().id().is_located());
    assert!(project.component(new).unwrap().id().is_located());
    assert_eq!(project.identified_count(), 1);
    assert!(project.integrity_violations().is_empty());
}

#[test]
fn detached_item_keeps_identifier_until_reinserted() {
    let (mut project, clock) = project();
    let admin = admin();
    let wall = project.create_component("Wall");
    let door = project.create_component("Door");
    project.add_component(&admin, wall).unwrap();
    project.add_component(&admin, door).unwrap();
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&admin, wall, width).unwrap();
    let width_id = *project.item(width).unwrap().id();

    let recorder = Recorder::attach(&mut project);
    clock.advance_secs(3);
    project.remove_item_without_delete(&admin, wall, width).unwrap();
    assert_eq!(project.item(width).unwrap().owner(), None);
    assert_eq!(*project.item(width).unwrap().id(), width_id);
    assert_eq!(project.get_by_id::<Parameter>(&width_id), Some(width));

    project.add_item(&admin, door, width).unwrap();
    assert_eq!(*project.item(width).unwrap().id(), width_id);
    assert_eq!(project.item(width).unwrap().owner(), Some(door));
    assert!(project.component(wall).unwrap().parameters().is_empty());
    assert_eq!(project.component(door).unwrap().parameters().last_change(), ts(3));
    assert_eq!(recorder.deletions(), 0);
    assert_eq!(recorder.collection_changes(), 2);
    assert!(project.integrity_violations().is_empty());
}

#[test]
fn denied_item_clear_keeps_every_item() {
    let (mut project, clock) = project();
    let architect = architect();
    let wall = component(&mut project, "Wall", SimUserRole::Architecture);
    project.add_component(&architect, wall).unwrap();
    for name in ["width", "height"] {
        let parameter = project.insert_item(Parameter::new(name, "m", 1.0));
        project.add_item(&architect, wall, parameter).unwrap();
    }

    clock.advance_secs(10);
    let recorder = Recorder::attach(&mut project);
    let result = project.clear_items::<Parameter>(&guest(), wall);
    assert_matches!(result, Err(SimError::AccessDenied { .. }));
    let node = project.component(wall).unwrap();
    assert_eq!(node.parameters().len(), 2);
    assert_eq!(node.parameters().last_change(), ts(0));
    assert_eq!(project.identified_count(), 3);
    assert!(recorder.events().is_empty());

    project.clear_items::<Parameter>(&architect, wall).unwrap();
    assert!(project.component(wall).unwrap().parameters().is_empty());
    assert_eq!(project.identified_count(), 1);
    assert_eq!(recorder.deletions(), 2);
}

fn access_changes(recorder: &Recorder) -> Vec<(SimUserRole, EntryProperty)> {
    recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ProjectEvent::AccessChanged { change, .. } => Some((change.role, change.property)),
            _ => None,
        })
        .collect()
}

#[test]
fn stamps_and_grants_raise_access_changes() {
    let (mut project, clock) = project();
    let architect = architect();
    let admin = admin();
    let wall = component(&mut project, "Wall", SimUserRole::Architecture);
    project.add_component(&architect, wall).unwrap();
    let recorder = Recorder::attach(&mut project);

    clock.advance_secs(1);
    let width = project.insert_item(Parameter::new("width", "m", 0.3));
    project.add_item(&architect, wall, width).unwrap();
    assert_eq!(
        access_changes(&recorder),
        vec![(SimUserRole::Architecture, EntryProperty::LastWrite)]
    );

    clock.advance_secs(1);
    recorder.clear();
    project
        .set_role_access(&admin, wall, SimUserRole::Guest, AccessPrivilege::READ)
        .unwrap();
    assert_eq!(
        access_changes(&recorder),
        vec![
            (SimUserRole::Administrator, EntryProperty::LastWrite),
            (SimUserRole::Guest, EntryProperty::Access),
        ]
    );
    assert!(project
        .component(wall)
        .unwrap()
        .access_profile()
        .has_access(SimUserRole::Guest, AccessPrivilege::READ));

    clock.advance_secs(1);
    recorder.clear();
    project
        .reset_access_flags(&admin, wall, SimUserRole::Architecture)
        .unwrap();
    assert_eq!(
        access_changes(&recorder),
        vec![
            (SimUserRole::Administrator, EntryProperty::LastWrite),
            (SimUserRole::Guest, EntryProperty::Access),
        ]
    );
    assert!(!project
        .component(wall)
        .unwrap()
        .access_profile()
        .has_access(SimUserRole::Guest, AccessPrivilege::READ));
}
