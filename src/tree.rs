//! Mutators for the priority dependency tree.
//!
//! The tree is rooted at the connection stream. Links are non-owning: a
//! parent holds its children in an insertion-ordered map and every child
//! holds its parent's id. Each operation here leaves `total_child_weights`
//! equal to the sum of the direct children's weights.

use store::{Key, Store};

impl<F> Store<F> {
    /// Attaches `child` under `parent`.
    ///
    /// If `exclusive` is set, the previous children of `parent` are first
    /// moved down to become non-exclusive children of `child`, preserving
    /// their relative order.
    pub(crate) fn add_child(&mut self, parent: Key, child: Key, exclusive: bool) {
        if exclusive {
            let prev = self[parent].take_children();
            for (_, grandchild) in prev {
                self.add_child(child, grandchild, false);
            }
        }

        let parent_id = self[parent].id();
        let (child_id, child_weight) = {
            let child = &self[child];
            (child.id(), child.weight())
        };

        self[child].parent = Some(parent_id);

        // The map is keyed by id, so re-attaching an existing child must
        // not count its weight twice.
        let parent = &mut self[parent];
        if parent.children.insert(child_id, child).is_none() {
            parent.total_child_weights += child_weight as u32;
        }
    }

    /// Unlinks `child` from `parent` permanently, promoting the child's
    /// own dependents to direct children of `parent`.
    pub(crate) fn remove_child(&mut self, parent: Key, child: Key) {
        let child_id = self[child].id();

        if self[parent].children.remove(&child_id).is_some() {
            let weight = self[child].weight() as u32;
            self[parent].total_child_weights -= weight;
            self[child].parent = None;

            let grandchildren = self[child].take_children();
            for (_, grandchild) in grandchildren {
                self.add_child(parent, grandchild, false);
            }
        }
    }

    /// Unlinks `child` from `parent`, leaving the child's subtree intact so
    /// the branch can be moved as a whole.
    pub(crate) fn remove_child_branch(&mut self, parent: Key, child: Key) {
        let child_id = self[child].id();

        if self[parent].children.remove(&child_id).is_some() {
            let weight = self[child].weight() as u32;
            self[parent].total_child_weights -= weight;
            self[child].parent = None;
        }
    }

    /// Updates a stream's weight, keeping its parent's cached sum current.
    pub(crate) fn set_weight(&mut self, key: Key, weight: u16) {
        let (old, parent) = {
            let stream = &self[key];
            (stream.weight(), stream.parent())
        };

        if weight != old {
            if let Some(parent_id) = parent {
                if let Some(parent_key) = self.find(parent_id) {
                    let parent = &mut self[parent_key];
                    parent.total_child_weights =
                        parent.total_child_weights - old as u32 + weight as u32;
                }
            }
        }

        self[key].weight = weight;
    }

    /// Resolves a stream's parent to its store key, if it has one.
    pub(crate) fn parent_key(&self, key: Key) -> Option<Key> {
        match self[key].parent() {
            Some(id) => self.find(id),
            None => None,
        }
    }

    /// True when `ancestor` lies on the parent chain of `key`.
    pub(crate) fn is_descendant_of(&self, key: Key, ancestor: Key) -> bool {
        let ancestor_id = self[ancestor].id();
        let mut next = self[key].parent();

        while let Some(id) = next {
            if id == ancestor_id {
                return true;
            }
            next = match self.get(id) {
                Some(stream) => stream.parent(),
                None => None,
            };
        }

        false
    }
}
