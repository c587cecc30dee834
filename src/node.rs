//! Tree node representation.
//!
//! A node holds two child links, its key and value, and a tri-state balance
//! marker. There is no parent link; every path-sensitive operation tracks its
//! own ancestry on the way down.

use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU32;

/// Index of a node inside its allocator.
///
/// Backed by `NonZeroU32` so that `Option<NodeId>` stays 4 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Largest slot index representable by a `NodeId`.
    pub const MAX_INDEX: usize = (u32::MAX - 1) as usize;

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        if index > Self::MAX_INDEX {
            return None;
        }
        NonZeroU32::new(index as u32 + 1).map(Self)
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// A possibly absent child reference.
pub type Link = Option<NodeId>;

/// Child side. `Left` holds lower keys, `Right` higher keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Side to descend for a probe that compared as `ord` against a node key.
    ///
    /// Equal keys descend right, which leads an erase walk to the in-order
    /// successor.
    #[inline]
    pub fn of(ord: Ordering) -> Self {
        if ord == Ordering::Less {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

/// Which subtree, if any, is taller.
///
/// This is a marker, not a counted height difference: AVL maintenance only
/// ever needs to tell these three cases apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Balance {
    #[default]
    Balanced,
    LeftHeavy,
    RightHeavy,
}

impl Balance {
    #[inline]
    pub fn heavy(dir: Dir) -> Self {
        match dir {
            Dir::Left => Balance::LeftHeavy,
            Dir::Right => Balance::RightHeavy,
        }
    }

    /// The taller side, or `None` when balanced.
    #[inline]
    pub fn heavy_side(self) -> Option<Dir> {
        match self {
            Balance::Balanced => None,
            Balance::LeftHeavy => Some(Dir::Left),
            Balance::RightHeavy => Some(Dir::Right),
        }
    }

    #[inline]
    pub fn is_balanced(self) -> bool {
        self == Balance::Balanced
    }
}

/// A tree node. Sets use `V = ()`.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub links: [Link; 2],
    pub balance: Balance,
}

impl<K, V> Node<K, V> {
    /// A detached leaf.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            links: [None, None],
            balance: Balance::Balanced,
        }
    }

    #[inline]
    pub fn link(&self, dir: Dir) -> Link {
        self.links[dir.index()]
    }

    #[inline]
    pub fn set_link(&mut self, dir: Dir, link: Link) {
        self.links[dir.index()] = link;
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.links == [None, None]
    }

    pub fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Location of a link: the tree root, or one side of a node.
///
/// Rotations rewrite the subtree root through its slot, which replaces the
/// parent pointer a node does not have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Root,
    Child(NodeId, Dir),
}
