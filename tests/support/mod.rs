#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use h2_conn::{Listener, Stream, StreamId};

/// A recorded lifecycle event, by stream id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Added(StreamId),
    Active(StreamId),
    HalfClosed(StreamId),
    Inactive(StreamId),
    Removed(StreamId),
    PriorityChanged {
        stream: StreamId,
        prev_parent: StreamId,
    },
    SubtreeChanged {
        stream: StreamId,
        subtree_root: StreamId,
    },
}

/// Listener that records the fan-out sequence for assertion. Clones share
/// the same log, so a test can keep one handle and hand the other to the
/// connection.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> EventLog {
        EventLog {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl<F> Listener<F> for EventLog {
    fn stream_added(&mut self, stream: &Stream<F>) {
        self.push(Event::Added(stream.id()));
    }

    fn stream_active(&mut self, stream: &Stream<F>) {
        self.push(Event::Active(stream.id()));
    }

    fn stream_half_closed(&mut self, stream: &Stream<F>) {
        self.push(Event::HalfClosed(stream.id()));
    }

    fn stream_inactive(&mut self, stream: &Stream<F>) {
        self.push(Event::Inactive(stream.id()));
    }

    fn stream_removed(&mut self, stream: &Stream<F>) {
        self.push(Event::Removed(stream.id()));
    }

    fn stream_priority_changed(&mut self, stream: &Stream<F>, prev_parent: &Stream<F>) {
        self.push(Event::PriorityChanged {
            stream: stream.id(),
            prev_parent: prev_parent.id(),
        });
    }

    fn stream_priority_subtree_changed(&mut self, stream: &Stream<F>, subtree_root: &Stream<F>) {
        self.push(Event::SubtreeChanged {
            stream: stream.id(),
            subtree_root: subtree_root.id(),
        });
    }
}

pub fn id(n: u32) -> StreamId {
    StreamId::from(n)
}
