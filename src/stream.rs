use ordermap::OrderMap;

use error::{Error, Reason, User};
use state::State;
use store::Key;
use stream_id::StreamId;

use std::mem;

/// Smallest legal priority weight.
pub const MIN_WEIGHT: u16 = 1;

/// Largest legal priority weight.
pub const MAX_WEIGHT: u16 = 256;

/// Weight assigned to a stream that has never been reprioritized.
pub const DEFAULT_WEIGHT: u16 = 16;

/// A single node of the connection's stream collection: identity, state
/// machine position, priority slot, and the links that place it in the
/// dependency tree.
///
/// `F` is the flow-control subsystem's per-stream state; this module never
/// interprets it.
#[derive(Debug)]
pub struct Stream<F> {
    /// The stream identifier. Immutable.
    id: StreamId,

    /// Current state of the stream.
    pub(crate) state: State,

    // ===== Fields related to prioritization =====

    /// Priority weight, in `[MIN_WEIGHT, MAX_WEIGHT]`.
    pub(crate) weight: u16,

    /// The stream this one depends on; `None` only for the connection
    /// stream and for nodes mid-restructure.
    pub(crate) parent: Option<StreamId>,

    /// Direct dependents, in insertion order. The order is observable and
    /// exclusive reparenting relies on it.
    pub(crate) children: OrderMap<StreamId, Key>,

    /// Cached sum of the direct children's weights.
    pub(crate) total_child_weights: u32,

    // ===== Fields owned by the flow-control subsystem =====

    pub(crate) inbound_flow: Option<F>,
    pub(crate) outbound_flow: Option<F>,
}

impl<F> Stream<F> {
    pub(crate) fn new(id: StreamId) -> Stream<F> {
        Stream {
            id,
            state: State::default(),
            weight: DEFAULT_WEIGHT,
            parent: None,
            children: OrderMap::new(),
            total_child_weights: 0,
            inbound_flow: None,
            outbound_flow: None,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    pub fn total_child_weights(&self) -> u32 {
        self.total_child_weights
    }

    /// The stream this one currently depends on.
    pub fn parent(&self) -> Option<StreamId> {
        self.parent
    }

    /// Ids of the direct dependents, in insertion order.
    pub fn children<'a>(&'a self) -> impl Iterator<Item = StreamId> + 'a {
        self.children.keys().cloned()
    }

    pub fn has_child(&self, id: StreamId) -> bool {
        self.children.contains_key(&id)
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.num_children() == 0
    }

    /// True for the connection stream only.
    pub fn is_root(&self) -> bool {
        self.id.is_zero()
    }

    pub fn local_side_open(&self) -> bool {
        self.state.local_side_open()
    }

    pub fn remote_side_open(&self) -> bool {
        self.state.remote_side_open()
    }

    /// Checks that the stream is in one of `allowed`, failing with the
    /// caller-supplied error code otherwise.
    pub fn verify_state(&self, error: Reason, allowed: &[State]) -> Result<(), Error> {
        if self.is_root() {
            return Err(User::ConnectionStream.into());
        }

        if allowed.contains(&self.state) {
            Ok(())
        } else {
            trace!(
                "verify_state: stream {:?} in unexpected state {:?}",
                self.id,
                self.state
            );
            Err(error.into())
        }
    }

    pub fn inbound_flow(&self) -> Option<&F> {
        self.inbound_flow.as_ref()
    }

    pub fn outbound_flow(&self) -> Option<&F> {
        self.outbound_flow.as_ref()
    }

    /// Drains the child map, zeroing the cached weight sum, and hands the
    /// previous children back in insertion order.
    pub(crate) fn take_children(&mut self) -> OrderMap<StreamId, Key> {
        self.total_child_weights = 0;
        mem::replace(&mut self.children, OrderMap::new())
    }
}
