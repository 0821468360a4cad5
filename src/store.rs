use fnv::FnvHashMap;
use slab::Slab;

use stream::Stream;
use stream_id::StreamId;

use std::ops;

/// Storage for the streams of a connection, including the connection
/// stream.
///
/// The store is the sole owner of every stream; the priority tree and the
/// active set only hold ids and keys into it.
#[derive(Debug)]
pub(crate) struct Store<F> {
    slab: Slab<Stream<F>>,
    ids: FnvHashMap<StreamId, usize>,
}

/// References an entry in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Key(usize);

// ===== impl Store =====

impl<F> Store<F> {
    pub fn new() -> Self {
        Store {
            slab: Slab::new(),
            ids: FnvHashMap::default(),
        }
    }

    pub fn find(&self, id: StreamId) -> Option<Key> {
        self.ids.get(&id).map(|&key| Key(key))
    }

    pub fn get(&self, id: StreamId) -> Option<&Stream<F>> {
        self.ids.get(&id).map(move |&key| &self.slab[key])
    }

    pub fn insert(&mut self, id: StreamId, val: Stream<F>) -> Key {
        let key = self.slab.insert(val);
        assert!(self.ids.insert(id, key).is_none());

        Key(key)
    }

    /// Drops the stream, releasing its slot. The caller must have unlinked
    /// it from the tree first.
    pub fn remove(&mut self, id: StreamId) -> Option<Stream<F>> {
        self.ids.remove(&id).map(|key| self.slab.remove(key))
    }

    /// Number of streams held, the connection stream included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl<F> ops::Index<Key> for Store<F> {
    type Output = Stream<F>;

    fn index(&self, key: Key) -> &Self::Output {
        self.slab.index(key.0)
    }
}

impl<F> ops::IndexMut<Key> for Store<F> {
    fn index_mut(&mut self, key: Key) -> &mut Self::Output {
        self.slab.index_mut(key.0)
    }
}
