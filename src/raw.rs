//! Root link plus node storage, and the rotation primitives.
//!
//! Everything here is pure link surgery. Balance markers are left to the
//! [`Balancer`](crate::balancer::Balancer).

use std::borrow::Borrow;
use std::marker::PhantomData;

use crate::alloc::NodeAlloc;
use crate::error::Result;
use crate::node::{Balance, Dir, Link, Node, NodeId, Slot};

/// A node graph reachable from a single root link.
///
/// The graph is exclusively owned: every allocated node is reachable from
/// `root` through exactly one link.
#[derive(Clone)]
pub struct RawTree<K, V, A> {
    pub(crate) root: Link,
    pub(crate) nodes: A,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, A: NodeAlloc<K, V>> RawTree<K, V, A> {
    pub fn new(nodes: A) -> Self {
        Self {
            root: None,
            nodes,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn root(&self) -> Link {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes.node(id)
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes.node_mut(id)
    }

    #[inline]
    pub fn child(&self, id: NodeId, dir: Dir) -> Link {
        self.node(id).link(dir)
    }

    #[inline]
    pub fn balance(&self, id: NodeId) -> Balance {
        self.node(id).balance
    }

    #[inline]
    pub fn set_balance(&mut self, id: NodeId, balance: Balance) {
        self.node_mut(id).balance = balance;
    }

    /// Reads the link stored at `slot`.
    #[inline]
    pub fn link(&self, slot: Slot) -> Link {
        match slot {
            Slot::Root => self.root,
            Slot::Child(parent, dir) => self.child(parent, dir),
        }
    }

    /// Overwrites the link stored at `slot`.
    #[inline]
    pub fn set_link(&mut self, slot: Slot, link: Link) {
        match slot {
            Slot::Root => self.root = link,
            Slot::Child(parent, dir) => self.node_mut(parent).set_link(dir, link),
        }
    }

    /// Allocates a detached leaf. Nothing is linked.
    #[inline]
    pub fn alloc_leaf(&mut self, key: K, value: V) -> Result<NodeId> {
        self.nodes.allocate(Node::new(key, value))
    }

    /// Reads a link that the caller knows is occupied.
    #[inline]
    pub fn occupied(&self, slot: Slot) -> NodeId {
        self.link(slot).expect("slot on the search path holds a node")
    }

    /// Side of `at` on which the key of node `target` lies.
    #[inline]
    pub fn step_toward(&self, at: NodeId, target: NodeId) -> Dir
    where
        K: Ord,
    {
        Dir::of(self.node(target).key.cmp(&self.node(at).key))
    }

    /// Finds the node whose key equals `key`.
    pub fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            match key.cmp(node.key.borrow()) {
                std::cmp::Ordering::Equal => return Some(id),
                ord => cur = node.link(Dir::of(ord)),
            }
        }
        None
    }

    /// Follows `dir` links from the root to the last node on that spine.
    pub fn extreme(&self, dir: Dir) -> Link {
        let mut cur = self.root?;
        while let Some(next) = self.child(cur, dir) {
            cur = next;
        }
        Some(cur)
    }

    /// Single rotation at `slot`.
    ///
    /// With `B` the subtree root and `D` its child on side `dir`, promotes `D`:
    /// `B` becomes `D`'s child on the opposite side, and `D`'s former
    /// opposite-side child `C` moves under `B` on side `dir`.
    ///
    /// ```text
    ///       B                D
    ///      / \              / \
    ///     A   D     =>     B   E
    ///        / \          / \
    ///       C   E        A   C
    /// ```
    ///
    /// Returns `E`, `D`'s child on side `dir`, which is untouched.
    pub fn rotate2(&mut self, slot: Slot, dir: Dir) -> Link {
        let b = self.occupied(slot);
        let d = self
            .child(b, dir)
            .expect("single rotation needs a child on the rotation side");
        let c = self.child(d, dir.opposite());
        let e = self.child(d, dir);

        self.set_link(slot, Some(d));
        self.node_mut(d).set_link(dir.opposite(), Some(b));
        self.node_mut(b).set_link(dir, c);
        e
    }

    /// Double rotation at `slot`.
    ///
    /// With `B` the subtree root, `F` its child on side `dir` and `D` the child
    /// of `F` on the opposite side, promotes `D` with `B` and `F` as its
    /// children. `D`'s former children `C` and `E` (either may be absent) move
    /// under `B` and `F` respectively.
    ///
    /// ```text
    ///       B                  D
    ///      / \               /   \
    ///     A   F             B     F
    ///        / \     =>    / \   / \
    ///       D   G         A   C E   G
    ///      / \
    ///     C   E
    /// ```
    pub fn rotate3(&mut self, slot: Slot, dir: Dir) {
        let b = self.occupied(slot);
        let f = self
            .child(b, dir)
            .expect("double rotation needs a child on the rotation side");
        let d = self
            .child(f, dir.opposite())
            .expect("double rotation needs an inner grandchild");
        let c = self.child(d, dir.opposite());
        let e = self.child(d, dir);

        self.set_link(slot, Some(d));
        {
            let node_d = self.node_mut(d);
            node_d.set_link(dir.opposite(), Some(b));
            node_d.set_link(dir, Some(f));
        }
        self.node_mut(b).set_link(dir, c);
        self.node_mut(f).set_link(dir.opposite(), e);
    }
}
