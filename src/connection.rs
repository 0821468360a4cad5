use ordermap::OrderSet;

use endpoint::{Endpoint, EndpointMut, Side};
use error::{Error, Reason, User};
use listener::{Listener, ListenerId};
use removal::{ImmediateRemovalPolicy, RemovalPolicy};
use state::State;
use store::{Key, Store};
use stream::{Stream, MAX_WEIGHT, MIN_WEIGHT};
use stream_id::StreamId;

use std::ops;

/// The in-memory model of a single HTTP/2 connection: the stream
/// collection, the priority tree rooted at the connection stream, the
/// active set, and the listeners observing stream lifecycles.
///
/// The model is passive and single-threaded; it is driven by an external
/// frame-processing loop and performs no I/O of its own.
#[derive(Debug)]
pub struct Connection<F> {
    /// Stream storage, including the connection stream.
    pub(crate) store: Store<F>,

    /// The connection stream, root of the priority tree.
    root: Key,

    /// Streams that are currently active, in activation order.
    active: OrderSet<StreamId>,

    /// Lifecycle observers, notified in registration order.
    listeners: Vec<(ListenerId, Box<dyn Listener<F>>)>,
    next_listener_id: u64,

    pub(crate) local: Endpoint,
    pub(crate) remote: Endpoint,

    removal_policy: Box<dyn RemovalPolicy>,

    go_away_sent: bool,
    go_away_received: bool,
}

/// Mutable handle to a single stream of a connection.
///
/// Reads are served through `Deref<Target = Stream<F>>`; the methods here
/// are the mutations, which fan lifecycle events out to the connection's
/// listeners.
#[derive(Debug)]
pub struct StreamMut<'a, F: 'a> {
    conn: &'a mut Connection<F>,
    key: Key,
}

// ===== impl Connection =====

impl<F> Connection<F> {
    /// Creates a connection model with compression disabled and an
    /// immediate stream removal policy.
    pub fn new(server: bool) -> Connection<F> {
        Connection::with_removal_policy(server, false, Box::new(ImmediateRemovalPolicy::new()))
    }

    /// Creates a connection model with the given settings.
    pub fn with_removal_policy(
        server: bool,
        allow_compressed_data: bool,
        removal_policy: Box<dyn RemovalPolicy>,
    ) -> Connection<F> {
        let mut store = Store::new();
        let root = store.insert(StreamId::zero(), Stream::new(StreamId::zero()));

        Connection {
            store,
            root,
            active: OrderSet::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            local: Endpoint::new(server, allow_compressed_data),
            remote: Endpoint::new(!server, false),
            removal_policy,
            go_away_sent: false,
            go_away_received: false,
        }
    }

    pub fn is_server(&self) -> bool {
        self.local.is_server()
    }

    /// The connection stream, id zero. It roots the priority tree and
    /// cannot be closed, reprioritized, or reserved.
    pub fn connection_stream(&self) -> &Stream<F> {
        &self.store[self.root]
    }

    pub fn stream(&self, id: StreamId) -> Option<&Stream<F>> {
        self.store.get(id)
    }

    /// Like [`stream`], but a missing stream is a protocol error.
    ///
    /// [`stream`]: #method.stream
    pub fn require_stream(&self, id: StreamId) -> Result<&Stream<F>, Error> {
        match self.store.get(id) {
            Some(stream) => Ok(stream),
            None => {
                trace!("require_stream; stream {:?} does not exist", id);
                Err(Reason::PROTOCOL_ERROR.into())
            }
        }
    }

    pub fn stream_mut<'a>(&'a mut self, id: StreamId) -> Option<StreamMut<'a, F>> {
        match self.store.find(id) {
            Some(key) => Some(StreamMut { conn: self, key }),
            None => None,
        }
    }

    pub fn require_stream_mut<'a>(&'a mut self, id: StreamId) -> Result<StreamMut<'a, F>, Error> {
        match self.store.find(id) {
            Some(key) => Ok(StreamMut { conn: self, key }),
            None => {
                trace!("require_stream; stream {:?} does not exist", id);
                Err(Reason::PROTOCOL_ERROR.into())
            }
        }
    }

    pub fn num_active_streams(&self) -> usize {
        self.active.len()
    }

    /// Currently active streams, in activation order.
    pub fn active_streams<'a>(&'a self) -> impl Iterator<Item = &'a Stream<F>> + 'a {
        let store = &self.store;
        self.active.iter().filter_map(move |&id| store.get(id))
    }

    /// True when `ancestor` lies on `stream`'s parent chain. False if
    /// either id is unknown.
    pub fn is_descendant_of(&self, stream: StreamId, ancestor: StreamId) -> bool {
        match (self.store.find(stream), self.store.find(ancestor)) {
            (Some(stream), Some(ancestor)) => self.store.is_descendant_of(stream, ancestor),
            _ => false,
        }
    }

    pub fn local(&self) -> &Endpoint {
        &self.local
    }

    pub fn remote(&self) -> &Endpoint {
        &self.remote
    }

    pub fn local_mut<'a>(&'a mut self) -> EndpointMut<'a, F> {
        EndpointMut::new(self, Side::Local)
    }

    pub fn remote_mut<'a>(&'a mut self) -> EndpointMut<'a, F> {
        EndpointMut::new(self, Side::Remote)
    }

    pub fn add_listener(&mut self, listener: Box<dyn Listener<F>>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|entry| entry.0 != id);
    }

    /// Records that a GOAWAY frame was sent to the peer. Sticky.
    pub fn go_away_sent(&mut self) {
        self.go_away_sent = true;
    }

    /// Records that a GOAWAY frame was received from the peer. Sticky.
    pub fn go_away_received(&mut self) {
        self.go_away_received = true;
    }

    pub fn is_go_away_sent(&self) -> bool {
        self.go_away_sent
    }

    pub fn is_go_away_received(&self) -> bool {
        self.go_away_received
    }

    /// True once either direction has gone away; new stream creation is
    /// refused from then on.
    pub fn is_go_away(&self) -> bool {
        self.go_away_sent || self.go_away_received
    }

    /// Prompts a deferring removal policy to hand back its marked streams
    /// and unlinks them. With the immediate policy this is a no-op, since
    /// removal already happened inside `close`.
    pub fn flush_removals(&mut self) {
        self.removal_policy.flush();
        self.reap_removals();
    }

    /// Registers a newly created stream: stores it, attaches it under the
    /// connection stream, and announces it.
    pub(crate) fn register_stream(&mut self, id: StreamId, state: State) -> Key {
        let key = self.store.insert(id, Stream::new(id));
        self.store[key].state = state;

        let root = self.root;
        self.store.add_child(root, key, false);

        self.notify_added(key);
        key
    }

    pub(crate) fn activate(&mut self, key: Key) {
        let id = self.store[key].id();
        self.active.insert(id);
        self.notify_active(key);
    }

    fn deactivate(&mut self, key: Key) {
        let id = self.store[key].id();
        self.active.remove(&id);
        self.notify_inactive(key);
    }

    fn close_stream(&mut self, key: Key) {
        if self.store[key].state.is_closed() {
            return;
        }

        trace!("close; id={:?}", self.store[key].id());

        self.store[key].state = State::Closed;
        self.deactivate(key);

        let id = self.store[key].id();
        self.removal_policy.mark_for_removal(id);
        self.reap_removals();
    }

    fn reap_removals(&mut self) {
        while let Some(id) = self.removal_policy.pop_due() {
            self.remove_stream(id);
        }
    }

    /// Unlinks a stream: announces the removal, detaches it from the tree
    /// promoting its children to its former parent, and drops it.
    fn remove_stream(&mut self, id: StreamId) {
        let key = match self.store.find(id) {
            Some(key) => key,
            None => return,
        };

        trace!("remove_stream; id={:?}", id);

        self.notify_removed(key);

        if let Some(parent) = self.store.parent_key(key) {
            self.store.remove_child(parent, key);
        }

        self.store.remove(id);
    }

    // ===== listener fan-out =====

    fn notify_added(&mut self, key: Key) {
        let stream = &self.store[key];
        for entry in &mut self.listeners {
            entry.1.stream_added(stream);
        }
    }

    fn notify_active(&mut self, key: Key) {
        let stream = &self.store[key];
        for entry in &mut self.listeners {
            entry.1.stream_active(stream);
        }
    }

    fn notify_half_closed(&mut self, key: Key) {
        let stream = &self.store[key];
        for entry in &mut self.listeners {
            entry.1.stream_half_closed(stream);
        }
    }

    fn notify_inactive(&mut self, key: Key) {
        let stream = &self.store[key];
        for entry in &mut self.listeners {
            entry.1.stream_inactive(stream);
        }
    }

    fn notify_removed(&mut self, key: Key) {
        let stream = &self.store[key];
        for entry in &mut self.listeners {
            entry.1.stream_removed(stream);
        }
    }

    fn notify_priority_changed(&mut self, key: Key, prev_parent: Key) {
        let stream = &self.store[key];
        let prev_parent = &self.store[prev_parent];
        for entry in &mut self.listeners {
            entry.1.stream_priority_changed(stream, prev_parent);
        }
    }

    fn notify_priority_subtree_changed(&mut self, key: Key, subtree_root: Key) {
        let stream = &self.store[key];
        let subtree_root = &self.store[subtree_root];
        for entry in &mut self.listeners {
            entry.1.stream_priority_subtree_changed(stream, subtree_root);
        }
    }
}

// ===== impl StreamMut =====

impl<'a, F> StreamMut<'a, F> {
    fn check_not_root(&self) -> Result<(), Error> {
        if self.conn.store[self.key].is_root() {
            Err(User::ConnectionStream.into())
        } else {
            Ok(())
        }
    }

    /// Reprioritizes the stream: updates its weight and moves its branch
    /// under `parent`.
    ///
    /// When `parent` currently sits inside this stream's own subtree, the
    /// parent's branch is first hoisted to this stream's old position so
    /// the tree stays acyclic. When `exclusive` is set, the previous
    /// children of `parent` become children of this stream.
    pub fn set_priority(&mut self, parent: StreamId, weight: u16, exclusive: bool) -> Result<(), Error> {
        self.check_not_root()?;

        if weight < MIN_WEIGHT || weight > MAX_WEIGHT {
            return Err(User::InvalidWeight.into());
        }

        let key = self.key;
        let conn = &mut *self.conn;

        let new_parent = match conn.store.find(parent) {
            Some(key) => key,
            None => {
                trace!("set_priority; parent stream {:?} does not exist", parent);
                return Err(Reason::PROTOCOL_ERROR.into());
            }
        };

        if new_parent == key {
            return Err(User::SelfDependency.into());
        }

        trace!(
            "set_priority; stream={:?} parent={:?} weight={} exclusive={}",
            conn.store[key].id(),
            parent,
            weight,
            exclusive
        );

        // The weight update lands even when no structural change follows.
        conn.store.set_weight(key, weight);

        let need_restructure = conn.store.is_descendant_of(new_parent, key);
        let old_parent = conn
            .store
            .parent_key(key)
            .expect("non-root stream is linked to a parent");

        if new_parent == old_parent && !exclusive {
            conn.notify_priority_changed(key, old_parent);
            return Ok(());
        }

        // Break the branch off its current parent, subtree intact.
        conn.store.remove_child_branch(old_parent, key);

        if need_restructure {
            // The new parent sits below this stream; hoist its branch up
            // to this stream's old position to break the would-be cycle.
            let hoisted_from = conn
                .store
                .parent_key(new_parent)
                .expect("descendant stream is linked to a parent");
            conn.store.remove_child_branch(hoisted_from, new_parent);
            conn.store.add_child(old_parent, new_parent, false);
        }

        conn.store.add_child(new_parent, key, exclusive);

        if need_restructure {
            conn.notify_priority_subtree_changed(key, new_parent);
        } else {
            conn.notify_priority_changed(key, old_parent);
        }

        Ok(())
    }

    /// Promotes a reserved stream into its half-closed open state and
    /// activates it.
    pub fn open_for_push(&mut self) -> Result<(), Error> {
        self.check_not_root()?;

        let state = self.conn.store[self.key].state;
        let next = match state {
            State::ReservedLocal => State::HalfClosedRemote,
            State::ReservedRemote => State::HalfClosedLocal,
            _ => {
                trace!("open_for_push on non-reserved stream; state={:?}", state);
                return Err(Reason::PROTOCOL_ERROR.into());
            }
        };

        trace!("open_for_push: {:?} => {:?}", state, next);

        self.conn.store[self.key].state = next;
        self.conn.activate(self.key);
        Ok(())
    }

    /// Closes the stream: deactivates it and marks it for removal.
    /// Closing a closed stream is a no-op.
    ///
    /// Closing consumes the handle: under an immediate removal policy the
    /// stream may be unlinked before this returns.
    pub fn close(self) -> Result<(), Error> {
        self.check_not_root()?;
        self.conn.close_stream(self.key);
        Ok(())
    }

    /// Records that the local side will send no more frames. A second
    /// call is a no-op; on a stream whose remote side is already done this
    /// closes the stream.
    pub fn close_local_side(self) -> Result<(), Error> {
        self.check_not_root()?;

        match self.conn.store[self.key].state {
            State::Open => {
                trace!("close_local_side: Open => HalfClosedLocal");
                self.conn.store[self.key].state = State::HalfClosedLocal;
                self.conn.notify_half_closed(self.key);
            }
            State::HalfClosedLocal => {}
            _ => self.conn.close_stream(self.key),
        }

        Ok(())
    }

    /// Records that the remote side will send no more frames. A second
    /// call is a no-op; on a stream whose local side is already done this
    /// closes the stream.
    pub fn close_remote_side(self) -> Result<(), Error> {
        self.check_not_root()?;

        match self.conn.store[self.key].state {
            State::Open => {
                trace!("close_remote_side: Open => HalfClosedRemote");
                self.conn.store[self.key].state = State::HalfClosedRemote;
                self.conn.notify_half_closed(self.key);
            }
            State::HalfClosedRemote => {}
            _ => self.conn.close_stream(self.key),
        }

        Ok(())
    }

    /// True when `ancestor` lies on this stream's parent chain.
    pub fn is_descendant_of(&self, ancestor: StreamId) -> bool {
        match self.conn.store.find(ancestor) {
            Some(ancestor) => self.conn.store.is_descendant_of(self.key, ancestor),
            None => false,
        }
    }

    // ===== flow-control slots =====

    pub fn set_inbound_flow(&mut self, flow: F) {
        self.conn.store[self.key].inbound_flow = Some(flow);
    }

    pub fn inbound_flow_mut(&mut self) -> Option<&mut F> {
        self.conn.store[self.key].inbound_flow.as_mut()
    }

    pub fn set_outbound_flow(&mut self, flow: F) {
        self.conn.store[self.key].outbound_flow = Some(flow);
    }

    pub fn outbound_flow_mut(&mut self) -> Option<&mut F> {
        self.conn.store[self.key].outbound_flow.as_mut()
    }
}

impl<'a, F: 'a> ops::Deref for StreamMut<'a, F> {
    type Target = Stream<F>;

    fn deref(&self) -> &Stream<F> {
        &self.conn.store[self.key]
    }
}
