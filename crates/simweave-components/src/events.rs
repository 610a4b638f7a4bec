//! Change notifications
//!
//! Every committed mutation queues [`ProjectEvent`]s. They are delivered after
//! the mutation finished, in order, to a snapshot of the registered
//! listeners. Listeners receive the project mutably; events they cause are
//! appended to the same queue and delivered by the outer dispatch loop, so a
//! listener never observes a half-applied operation.

use crate::object::{CollectionRef, ComponentKey, ObjectRef};
use crate::project::Project;
use simweave_core::{Identifier, ProfileChange};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Item leaving a collection, with the identifier it had before release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedItem {
    /// Handle of the removed item
    pub object: ObjectRef,
    /// Identifier before the location was released
    pub identifier: Identifier,
}

/// Structural change of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    /// Items appended or inserted
    Added(Vec<ObjectRef>),
    /// Items removed
    Removed(Vec<RemovedItem>),
    /// One item replaced in place
    Replaced {
        /// Item that left the collection
        old: RemovedItem,
        /// Item now at its position
        new: ObjectRef,
    },
    /// Collection cleared
    Reset(Vec<RemovedItem>),
}

/// Observable property of a project object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Component name
    Name,
    /// Parent link and container of a component
    Parent,
    /// Owning collection of an item
    Factory,
    /// Taxonomy slot of a component
    CurrentSlot,
    /// Slot of a child entry or reference
    Slot,
    /// Component filling a child entry
    Component,
    /// Target of a reference
    Target,
    /// Identifier of an item
    Identifier,
}

/// Notification raised by a committed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    /// A collection changed structurally
    CollectionChanged {
        /// Affected collection
        collection: CollectionRef,
        /// What happened
        change: CollectionChange,
    },
    /// A property of an object changed
    PropertyChanged {
        /// Affected object
        object: ObjectRef,
        /// Changed property
        property: Property,
    },
    /// An object is truly deleted; raised once per object, never for moves
    IsBeingDeleted {
        /// Deleted object
        object: ObjectRef,
        /// Identifier before release
        identifier: Identifier,
    },
    /// An access profile entry changed
    AccessChanged {
        /// Component owning the profile
        component: ComponentKey,
        /// What changed
        change: ProfileChange,
    },
}

/// Receiver of project notifications
pub trait ProjectListener {
    /// Handle `event`; the project may be mutated from here
    fn on_event(&self, project: &mut Project, event: &ProjectEvent);
}

impl<F> ProjectListener for F
where
    F: Fn(&mut Project, &ProjectEvent),
{
    fn on_event(&self, project: &mut Project, event: &ProjectEvent) {
        self(project, event);
    }
}

/// Registration handle returned by [`Project::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type ListenerList = Vec<(ListenerId, Rc<dyn ProjectListener>)>;

#[derive(Default)]
pub(crate) struct EventBus {
    listeners: ListenerList,
    next_listener: u64,
    pending: VecDeque<ProjectEvent>,
    dispatching: bool,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, listener: Rc<dyn ProjectListener>) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn emit(&mut self, event: ProjectEvent) {
        tracing::trace!(?event, "queued event");
        self.pending.push_back(event);
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn ProjectListener>> {
        self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
    }

    /// Claim the dispatch loop; `false` if a dispatch is already running
    pub(crate) fn begin_dispatch(&mut self) -> bool {
        if self.dispatching {
            return false;
        }
        self.dispatching = true;
        true
    }

    pub(crate) fn end_dispatch(&mut self) {
        self.dispatching = false;
    }

    pub(crate) fn next_pending(&mut self) -> Option<ProjectEvent> {
        self.pending.pop_front()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}
