//! Node allocation strategies.
//!
//! The tree never owns node memory directly. It asks a [`NodeAlloc`] for a slot
//! when inserting and hands the slot back when a node is unlinked. The default
//! [`Arena`] keeps nodes in one vector and threads vacated slots onto a free
//! list so erase-heavy workloads reuse memory instead of growing.

use log::debug;

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};

/// Storage for tree nodes addressed by [`NodeId`].
///
/// Implementations must keep a node at a stable id from `allocate` until
/// `release`.
pub trait NodeAlloc<K, V> {
    /// Stores `node` and returns its id. On failure nothing is stored.
    fn allocate(&mut self, node: Node<K, V>) -> Result<NodeId>;

    /// Removes the node at `id` and returns it. `id` becomes invalid.
    fn release(&mut self, id: NodeId) -> Node<K, V>;

    fn node(&self, id: NodeId) -> &Node<K, V>;

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V>;

    /// Largest number of nodes this allocator can hold at once.
    fn max_nodes(&self) -> usize {
        NodeId::MAX_INDEX + 1
    }

    /// Drops every node and returns to the empty state.
    fn reset(&mut self);

    fn shrink_to_fit(&mut self) {}

    /// Bytes reserved by the allocator.
    fn memory_usage(&self) -> usize;
}

#[derive(Clone, Debug)]
enum Entry<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

/// Vector-backed node storage with free-slot reuse.
#[derive(Clone, Debug)]
pub struct Arena<K, V> {
    entries: Vec<Entry<K, V>>,
    /// Head of the chain of vacant entries.
    free_head: Option<NodeId>,
    live: usize,
}

impl<K, V> Arena<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_head: None,
            live: 0,
        }
    }

    /// Reserves room for `additional` more nodes, reporting allocation failure.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.entries.try_reserve(additional)?;
        Ok(())
    }

    /// Number of nodes currently stored.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    #[cold]
    fn vacant_panic(id: NodeId) -> ! {
        panic!("node {id:?} is not allocated")
    }
}

impl<K, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeAlloc<K, V> for Arena<K, V> {
    fn allocate(&mut self, node: Node<K, V>) -> Result<NodeId> {
        if let Some(id) = self.free_head {
            let entry = &mut self.entries[id.index()];
            let Entry::Vacant { next_free } = *entry else {
                Self::vacant_panic(id)
            };
            self.free_head = next_free;
            *entry = Entry::Occupied(node);
            self.live += 1;
            return Ok(id);
        }

        let index = self.entries.len();
        let id = NodeId::from_index(index).ok_or(Error::CapacityExceeded {
            limit: NodeId::MAX_INDEX + 1,
        })?;
        self.entries.try_reserve(1)?;
        self.entries.push(Entry::Occupied(node));
        self.live += 1;
        Ok(id)
    }

    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let entry = &mut self.entries[id.index()];
        if let Entry::Vacant { .. } = entry {
            Self::vacant_panic(id);
        }
        let vacant = Entry::Vacant {
            next_free: self.free_head,
        };
        let Entry::Occupied(node) = std::mem::replace(entry, vacant) else {
            unreachable!("entry checked occupied above")
        };
        self.free_head = Some(id);
        self.live -= 1;
        node
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<K, V> {
        match &self.entries[id.index()] {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => Self::vacant_panic(id),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match &mut self.entries[id.index()] {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => Self::vacant_panic(id),
        }
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.free_head = None;
        self.live = 0;
    }

    fn shrink_to_fit(&mut self) {
        // Trailing vacant entries can only be dropped once the free list is
        // rebuilt without them.
        while matches!(self.entries.last(), Some(Entry::Vacant { .. })) {
            self.entries.pop();
        }
        let mut head = None;
        for index in (0..self.entries.len()).rev() {
            if let Entry::Vacant { next_free } = &mut self.entries[index] {
                *next_free = head;
                head = NodeId::from_index(index);
            }
        }
        self.free_head = head;
        let before = self.entries.capacity();
        self.entries.shrink_to_fit();
        debug!(
            "arena shrink: {} -> {} slots ({} live)",
            before,
            self.entries.capacity(),
            self.live
        );
    }

    fn memory_usage(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<Entry<K, V>>()
    }
}
