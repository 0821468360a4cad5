use connection::Connection;
use error::{Error, Reason, User};
use state::State;
use stream_id::StreamId;

/// Which side of the connection an endpoint handle operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Local,
    Remote,
}

/// One side of the connection: its role, stream-ID allocation counters,
/// and per-role settings.
#[derive(Debug)]
pub struct Endpoint {
    /// Whether this endpoint is the server side.
    server: bool,

    /// Raw allocation counter. Client-initiated streams are odd and
    /// server-initiated streams are even, so the counter advances by two;
    /// once it passes the 31-bit ceiling the endpoint is out of ids.
    pub(crate) next_stream_id: u32,

    /// Highest id actually created by this endpoint.
    pub(crate) last_stream_created: StreamId,

    /// Cap on the total number of streams registered in the connection.
    /// `None` is unbounded.
    pub(crate) max_streams: Option<usize>,

    /// Whether the opposite endpoint may push to this one.
    pub(crate) push_to_allowed: bool,

    /// Whether compressed DATA frames are accepted from the peer.
    pub(crate) allow_compressed_data: bool,
}

impl Endpoint {
    pub(crate) fn new(server: bool, allow_compressed_data: bool) -> Endpoint {
        Endpoint {
            server,
            // Zero is reserved for the connection and stream 1 is the
            // client-initiated stream answering an HTTP/1.1 upgrade.
            next_stream_id: if server { 2 } else { 1 },
            last_stream_created: StreamId::zero(),
            max_streams: None,
            push_to_allowed: !server,
            allow_compressed_data,
        }
    }

    pub fn is_server(&self) -> bool {
        self.server
    }

    /// The next stream id this endpoint would assign, without advancing
    /// the counter. `None` once the id space is exhausted.
    ///
    /// A fresh client reports 3, keeping 1 for the HTTP/1.1 upgrade
    /// response.
    pub fn next_stream_id(&self) -> Option<StreamId> {
        if self.next_stream_id > u32::from(StreamId::max()) {
            return None;
        }

        if self.next_stream_id > 1 {
            Some(StreamId::from(self.next_stream_id))
        } else {
            Some(StreamId::from(self.next_stream_id + 2))
        }
    }

    pub fn last_stream_created(&self) -> StreamId {
        self.last_stream_created
    }

    /// Whether the opposite endpoint is permitted to push to this one.
    pub fn allow_push_to(&self) -> bool {
        self.push_to_allowed
    }

    pub fn max_streams(&self) -> Option<usize> {
        self.max_streams
    }

    pub fn allow_compressed_data(&self) -> bool {
        self.allow_compressed_data
    }

    fn verify_stream_id(&self, id: StreamId) -> Result<(), Error> {
        if self.next_stream_id > u32::from(StreamId::max()) {
            trace!("no more streams can be created on this connection");
            return Err(Reason::PROTOCOL_ERROR.into());
        }

        if u32::from(id) < self.next_stream_id {
            trace!(
                "requested stream {:?} is behind the next expected stream {}",
                id,
                self.next_stream_id
            );
            return Err(Reason::PROTOCOL_ERROR.into());
        }

        let even = u32::from(id) % 2 == 0;
        if self.server != even {
            trace!(
                "requested stream {:?} is not correct for {} connection",
                id,
                if self.server { "server" } else { "client" }
            );
            return Err(Reason::PROTOCOL_ERROR.into());
        }

        Ok(())
    }
}

/// Mutable handle to one endpoint of a connection.
///
/// Creation and reservation register streams with the connection and fan
/// lifecycle events out to its listeners, which is why they live here
/// rather than on [`Endpoint`] itself.
#[derive(Debug)]
pub struct EndpointMut<'a, F: 'a> {
    conn: &'a mut Connection<F>,
    side: Side,
}

impl<'a, F> EndpointMut<'a, F> {
    pub(crate) fn new(conn: &'a mut Connection<F>, side: Side) -> EndpointMut<'a, F> {
        EndpointMut { conn, side }
    }

    fn endpoint(&self) -> &Endpoint {
        match self.side {
            Side::Local => &self.conn.local,
            Side::Remote => &self.conn.remote,
        }
    }

    fn endpoint_mut(&mut self) -> &mut Endpoint {
        match self.side {
            Side::Local => &mut self.conn.local,
            Side::Remote => &mut self.conn.remote,
        }
    }

    /// The endpoint on the other side of the connection.
    pub fn opposite(&self) -> &Endpoint {
        match self.side {
            Side::Local => &self.conn.remote,
            Side::Remote => &self.conn.local,
        }
    }

    pub fn is_server(&self) -> bool {
        self.endpoint().is_server()
    }

    pub fn next_stream_id(&self) -> Option<StreamId> {
        self.endpoint().next_stream_id()
    }

    pub fn last_stream_created(&self) -> StreamId {
        self.endpoint().last_stream_created()
    }

    pub fn allow_push_to(&self) -> bool {
        self.endpoint().allow_push_to()
    }

    /// Permits or forbids pushes toward this endpoint. Enabling push on a
    /// server endpoint is a caller error.
    pub fn set_allow_push_to(&mut self, allow: bool) -> Result<(), Error> {
        if allow && self.endpoint().is_server() {
            return Err(User::PushToServer.into());
        }

        self.endpoint_mut().push_to_allowed = allow;
        Ok(())
    }

    pub fn max_streams(&self) -> Option<usize> {
        self.endpoint().max_streams()
    }

    /// Bounds the total number of streams registered in the connection,
    /// the connection stream included. `None` is unbounded.
    pub fn set_max_streams(&mut self, max: Option<usize>) {
        self.endpoint_mut().max_streams = max;
    }

    pub fn allow_compressed_data(&self) -> bool {
        self.endpoint().allow_compressed_data()
    }

    pub fn set_allow_compressed_data(&mut self, allow: bool) {
        self.endpoint_mut().allow_compressed_data = allow;
    }

    /// Creates a stream initiated by this endpoint and activates it.
    ///
    /// The new stream starts `Open`, or half-closed on this endpoint's
    /// side when `half_closed` is set.
    pub fn create_stream(&mut self, id: StreamId, half_closed: bool) -> Result<StreamId, Error> {
        self.check_new_stream_allowed(id)?;

        let state = if half_closed {
            match self.side {
                Side::Local => State::HalfClosedLocal,
                Side::Remote => State::HalfClosedRemote,
            }
        } else {
            State::Open
        };

        {
            let endpoint = self.endpoint_mut();
            endpoint.next_stream_id = u32::from(id) + 2;
            endpoint.last_stream_created = id;
        }

        trace!("create_stream; id={:?} state={:?}", id, state);

        let key = self.conn.register_stream(id, state);
        self.conn.activate(key);

        Ok(id)
    }

    /// Reserves a stream promised by this endpoint. The reservation is
    /// registered in the stream collection and the priority tree but is
    /// not active until promoted by `open_for_push`.
    pub fn reserve_push_stream(&mut self, id: StreamId, parent: StreamId) -> Result<StreamId, Error> {
        let parent_key = match self.conn.store.find(parent) {
            Some(key) => key,
            None => {
                trace!("reserve_push_stream; parent stream {:?} missing", parent);
                return Err(Reason::PROTOCOL_ERROR.into());
            }
        };

        {
            let parent = &self.conn.store[parent_key];
            let open = match self.side {
                Side::Local => parent.local_side_open(),
                Side::Remote => parent.remote_side_open(),
            };

            if !open {
                trace!(
                    "reserve_push_stream; stream {:?} is not open for sending a push promise",
                    parent.id()
                );
                return Err(Reason::PROTOCOL_ERROR.into());
            }
        }

        if !self.opposite().allow_push_to() {
            trace!("reserve_push_stream; push not allowed to opposite endpoint");
            return Err(Reason::PROTOCOL_ERROR.into());
        }

        self.check_new_stream_allowed(id)?;

        let state = match self.side {
            Side::Local => State::ReservedLocal,
            Side::Remote => State::ReservedRemote,
        };

        {
            let endpoint = self.endpoint_mut();
            endpoint.next_stream_id = u32::from(id) + 2;
            endpoint.last_stream_created = id;
        }

        trace!("reserve_push_stream; id={:?} state={:?}", id, state);

        self.conn.register_stream(id, state);

        Ok(id)
    }

    fn check_new_stream_allowed(&self, id: StreamId) -> Result<(), Error> {
        if self.conn.is_go_away() {
            trace!("cannot create stream {:?}; connection is going away", id);
            return Err(Reason::PROTOCOL_ERROR.into());
        }

        self.endpoint().verify_stream_id(id)?;

        if let Some(max) = self.endpoint().max_streams {
            if self.conn.store.len() + 1 > max {
                trace!("cannot create stream {:?}; maximum streams exceeded", id);
                return Err(Reason::PROTOCOL_ERROR.into());
            }
        }

        Ok(())
    }
}
