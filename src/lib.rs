//! Connection-level stream bookkeeping for an HTTP/2 endpoint.
//!
//! This crate is the data-model spine an HTTP/2 codec plugs into: the
//! in-memory model of a single connection, its collection of streams, the
//! per-stream state machine, and the priority dependency tree. Frame
//! readers create and advance streams through it, writers query it to
//! select streams, flow controllers hang their per-stream state off it,
//! and listeners observe stream lifecycles. It parses no frames and does
//! no I/O.
#![deny(missing_debug_implementations)]

#[macro_use]
extern crate log;

// Hash function used for the stream registry's id map.
extern crate fnv;

// Insertion-ordered maps back the child lists and the active set; the
// iteration order of both is observable.
extern crate ordermap;

// Slab-backed stream storage.
extern crate slab;

pub mod error;

mod connection;
mod endpoint;
mod listener;
mod removal;
mod state;
mod store;
mod stream;
mod stream_id;
mod tree;

pub use connection::{Connection, StreamMut};
pub use endpoint::{Endpoint, EndpointMut};
pub use error::{Error, Reason, User};
pub use listener::{Listener, ListenerId};
pub use removal::{DeferredRemovalPolicy, ImmediateRemovalPolicy, RemovalPolicy};
pub use state::State;
pub use stream::{Stream, DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT};
pub use stream_id::StreamId;
