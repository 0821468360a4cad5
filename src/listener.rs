use stream::Stream;

use std::fmt;

/// Identifies a registered listener so it can later be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(pub(crate) u64);

/// Observer of stream lifecycle events.
///
/// Callbacks fire synchronously, in registration order, while the
/// triggering operation is still on the stack. Every method has a no-op
/// default so implementations subscribe only to what they need.
pub trait Listener<F>: fmt::Debug {
    /// The stream was registered with the connection.
    fn stream_added(&mut self, _stream: &Stream<F>) {}

    /// The stream joined the active set.
    fn stream_active(&mut self, _stream: &Stream<F>) {}

    /// One side of an open stream was closed.
    fn stream_half_closed(&mut self, _stream: &Stream<F>) {}

    /// The stream left the active set on its way to closed.
    fn stream_inactive(&mut self, _stream: &Stream<F>) {}

    /// The stream is about to be unlinked from the connection.
    fn stream_removed(&mut self, _stream: &Stream<F>) {}

    /// The stream was reprioritized without restructuring the tree.
    /// `prev_parent` is the parent it depended on before the change.
    fn stream_priority_changed(&mut self, _stream: &Stream<F>, _prev_parent: &Stream<F>) {}

    /// Reprioritizing the stream restructured the tree: `subtree_root` was
    /// hoisted out of the stream's subtree to become its new parent.
    fn stream_priority_subtree_changed(&mut self, _stream: &Stream<F>, _subtree_root: &Stream<F>) {}
}
