//! Shared setup for component integration tests

#![allow(dead_code)]

use simweave_components::{ComponentKey, Project, ProjectEvent, Slot};
use simweave_core::test_utils::test_clock;
use simweave_core::{ManualClock, SimUserRole};
use std::cell::RefCell;
use std::rc::Rc;

/// Install a fmt subscriber honoring `RUST_LOG`; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Project driven by a manual clock the test can advance
pub fn project() -> (Project, Rc<ManualClock>) {
    init_tracing();
    let clock = Rc::new(test_clock());
    let project = Project::new().with_clock(Rc::clone(&clock));
    (project, clock)
}

/// Detached component created by `creator` in the default slot
pub fn component(project: &mut Project, name: &str, creator: SimUserRole) -> ComponentKey {
    let slot = project.default_slot();
    project.create_component_as(name, creator, slot)
}

/// Child slot in the default taxonomy slot with `extension`
pub fn slot(project: &Project, extension: &str) -> Slot {
    Slot::new(project.default_slot(), extension)
}

/// Listener that keeps every delivered event
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<ProjectEvent>>>,
}

impl Recorder {
    /// Subscribe a fresh recorder to `project`
    pub fn attach(project: &mut Project) -> Self {
        let recorder = Self::default();
        let sink = Rc::clone(&recorder.events);
        project.subscribe(move |_: &mut Project, event: &ProjectEvent| {
            sink.borrow_mut().push(event.clone());
        });
        recorder
    }

    /// Events delivered so far
    pub fn events(&self) -> Vec<ProjectEvent> {
        self.events.borrow().clone()
    }

    /// Drop recorded events
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of `IsBeingDeleted` events delivered so far
    pub fn deletions(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, ProjectEvent::IsBeingDeleted { .. }))
            .count()
    }

    /// Number of `CollectionChanged` events delivered so far
    pub fn collection_changes(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, ProjectEvent::CollectionChanged { .. }))
            .count()
    }
}
