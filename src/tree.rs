//! The ordered map/set container.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use log::debug;

use crate::alloc::{Arena, NodeAlloc};
use crate::balancer::{AvlBalancer, Balancer};
use crate::error::Result;
use crate::node::{Dir, NodeId};
use crate::raw::RawTree;
use crate::stack::BoundedStack;

/// Direction of an enumeration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    /// The side walked first and the side walked after visiting a node.
    #[inline]
    fn sides(self) -> (Dir, Dir) {
        match self {
            Order::Ascending => (Dir::Left, Dir::Right),
            Order::Descending => (Dir::Right, Dir::Left),
        }
    }
}

/// Construction options for a [`Tree`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of nodes to reserve room for up front.
    pub initial_capacity: usize,
    /// Return node storage to the allocator's backing memory on `clear`.
    pub release_memory_on_clear: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            release_memory_on_clear: false,
        }
    }
}

/// A self-balancing binary search tree.
///
/// Keys are unique under `Ord`. With `V = ()` the tree is a set.
///
/// - `B` decides the shape of the tree; [`AvlBalancer`] by default.
/// - `A` stores the nodes; an [`Arena`] by default.
///
/// Nodes have no parent links, so there are no cursors or iterators with
/// external state. Enumeration goes through a visitor callback that can stop
/// early.
///
/// ```rust
/// use avl_rs::{AvlMap, Order};
///
/// let mut map: AvlMap<u32, &str> = AvlMap::new();
/// assert!(map.insert(2, "two"));
/// assert!(map.insert(1, "one"));
/// assert!(!map.insert(1, "uno"));
///
/// let mut keys = Vec::new();
/// map.enumerate(Order::Descending, |k, _| {
///     keys.push(*k);
///     true
/// });
/// assert_eq!(keys, [2, 1]);
/// assert_eq!(map.erase(&1), 1);
/// assert_eq!(map.get(&2), Some(&"two"));
/// ```
pub struct Tree<K, V = (), B = AvlBalancer, A = Arena<K, V>> {
    pub(crate) raw: RawTree<K, V, A>,
    len: usize,
    config: Config,
    _balancer: PhantomData<B>,
}

/// AVL ordered map.
pub type AvlMap<K, V> = Tree<K, V>;

/// AVL ordered set.
pub type AvlSet<K> = Tree<K, ()>;

impl<K, V> Tree<K, V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let nodes = Arena::with_capacity(config.initial_capacity);
        Self::with_alloc(nodes, config)
    }

    /// Like [`Tree::with_config`], reporting failure to reserve the initial capacity.
    pub fn try_with_config(config: Config) -> Result<Self> {
        let mut nodes = Arena::new();
        nodes.try_reserve(config.initial_capacity)?;
        Ok(Self::with_alloc(nodes, config))
    }
}

impl<K, V, B, A> Tree<K, V, B, A>
where
    A: NodeAlloc<K, V>,
{
    /// An empty tree storing its nodes in `nodes`.
    pub fn with_alloc(nodes: A, config: Config) -> Self {
        Self {
            raw: RawTree::new(nodes),
            len: 0,
            config,
            _balancer: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of entries the allocator can index.
    pub fn max_len(&self) -> usize {
        self.raw.nodes.max_nodes()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key).is_some()
    }

    /// Number of entries equal to `key`: 0 or 1.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        usize::from(self.contains(key))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key).map(|id| &self.raw.node(id).value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key).map(|id| {
            let node = self.raw.node(id);
            (&node.key, &node.value)
        })
    }

    /// Mutable access to a value. Keys and shape never change through this.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.raw.find(key)?;
        Some(&mut self.raw.node_mut(id).value)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Dir::Left).map(|id| {
            let node = self.raw.node(id);
            (&node.key, &node.value)
        })
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Dir::Right).map(|id| {
            let node = self.raw.node(id);
            (&node.key, &node.value)
        })
    }

    /// Calls `visit` on every entry in `order` until it returns `false`.
    pub fn enumerate<F>(&self, order: Order, visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let (first, _) = order.sides();
        let mut stack = BoundedStack::for_tree_len(self.len);
        let mut cur = self.raw.root();
        while let Some(id) = cur {
            stack.push(id);
            cur = self.raw.child(id, first);
        }
        self.drain_in_order(stack, order, visit);
    }

    /// Like [`Tree::enumerate`], starting from `key`.
    ///
    /// Ascending enumeration starts at the first key `>= key`; descending
    /// starts at the last key `<= key`.
    pub fn enumerate_from<Q, F>(&self, key: &Q, order: Order, visit: F)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&K, &V) -> bool,
    {
        let (first, second) = order.sides();
        // Descending enumeration mirrors the comparison.
        let past_bound = match order {
            Order::Ascending => Ordering::Less,
            Order::Descending => Ordering::Greater,
        };
        let mut stack = BoundedStack::for_tree_len(self.len);
        let mut cur = self.raw.root();
        while let Some(id) = cur {
            if self.raw.node(id).key.borrow().cmp(key) == past_bound {
                cur = self.raw.child(id, second);
            } else {
                stack.push(id);
                cur = self.raw.child(id, first);
            }
        }
        self.drain_in_order(stack, order, visit);
    }

    /// In-order walk over pending ancestors. Each entry on `stack` is visited,
    /// then the walk descends into its far side.
    fn drain_in_order<F>(&self, mut stack: BoundedStack<NodeId>, order: Order, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let (first, second) = order.sides();
        while let Some(id) = stack.pop() {
            let node = self.raw.node(id);
            if !visit(&node.key, &node.value) {
                return;
            }
            let mut cur = node.link(second);
            while let Some(next) = cur {
                stack.push(next);
                cur = self.raw.child(next, first);
            }
        }
    }

    /// Inserts `key` with `value` unless an equal key exists.
    ///
    /// Returns `true` when the key was added. An existing entry is left as is.
    ///
    /// # Panics
    /// Panics if the allocator cannot store another node.
    pub fn insert(&mut self, key: K, value: V) -> bool
    where
        K: Ord,
        B: Balancer,
    {
        match self.try_insert(key, value) {
            Ok(added) => added,
            Err(err) => panic!("tree insert failed: {err}"),
        }
    }

    /// Like [`Tree::insert`], reporting allocation failure instead of panicking.
    ///
    /// On error the tree is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool>
    where
        K: Ord,
        B: Balancer,
    {
        let added = B::insert(&mut self.raw, key, value)?.is_some();
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Removes the entry for `key`. Returns the number removed: 0 or 1.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        B: Balancer,
    {
        usize::from(self.remove_entry(key).is_some())
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        B: Balancer,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        B: Balancer,
    {
        let id = B::erase(&mut self.raw, key)?;
        let node = self.raw.nodes.release(id);
        self.len -= 1;
        Some(node.into_entry())
    }

    /// Removes every entry.
    ///
    /// Nodes are released bottom-up: a node goes once both of its subtrees
    /// are gone.
    pub fn clear(&mut self) {
        let released = self.len;
        let mut stack = BoundedStack::for_tree_len(self.len);
        if let Some(root) = self.raw.root.take() {
            stack.push(root);
        }
        while let Some(&id) = stack.front() {
            let node = self.raw.node_mut(id);
            if let Some(left) = node.links[Dir::Left.index()].take() {
                stack.push(left);
            } else if let Some(right) = node.links[Dir::Right.index()].take() {
                stack.push(right);
            } else {
                stack.pop();
                drop(self.raw.nodes.release(id));
            }
        }
        self.len = 0;
        if self.config.release_memory_on_clear {
            self.raw.nodes.reset();
            self.raw.nodes.shrink_to_fit();
        }
        debug!("tree cleared: {released} nodes released");
    }

    /// Exchanges the contents of two trees without touching any node.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    pub fn shrink_to_fit(&mut self) {
        self.raw.nodes.shrink_to_fit();
    }

    /// Bytes reserved for node storage.
    pub fn memory_usage(&self) -> usize {
        self.raw.nodes.memory_usage()
    }
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, B, A: Clone> Clone for Tree<K, V, B, A> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            len: self.len,
            config: self.config.clone(),
            _balancer: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, B, A: NodeAlloc<K, V>> fmt::Debug for Tree<K, V, B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.enumerate(Order::Ascending, |k, v| {
            map.entry(k, v);
            true
        });
        map.finish()
    }
}

impl<K: Ord, V, B: Balancer, A: NodeAlloc<K, V>> Extend<(K, V)> for Tree<K, V, B, A> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Tree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
