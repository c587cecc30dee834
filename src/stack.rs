//! Fixed-capacity LIFO used to walk the tree without recursion.
//!
//! Nodes carry no parent links, so traversals remember their ancestors here.
//! The capacity is chosen from the tree's worst-case height; running past it
//! means the balance invariant is already broken.

use log::error;
use smallvec::SmallVec;

/// Inline slots before the stack spills to the heap.
///
/// 32 levels cover AVL trees of several million nodes.
const INLINE_DEPTH: usize = 32;

/// Upper bound on the height of an AVL tree holding `len` nodes.
///
/// An AVL tree of `n` nodes is at most `1.4405 * log2(n + 2)` tall. With `b`
/// the bit length of `n + 2`, `b + b / 2 + 1` is never below `1.5 * log2(n + 2)`.
#[inline]
pub fn height_bound(len: usize) -> usize {
    let bits = (usize::BITS - len.saturating_add(2).leading_zeros()) as usize;
    bits + bits / 2 + 1
}

/// A last-in-first-out buffer that never grows past its capacity.
pub struct BoundedStack<T> {
    items: SmallVec<[T; INLINE_DEPTH]>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: SmallVec::with_capacity(capacity),
            capacity,
        }
    }

    /// Stack deep enough to hold one root-to-leaf path of a tree with `len` nodes.
    pub fn for_tree_len(len: usize) -> Self {
        Self::new(height_bound(len))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Pushes `value`, handing it back if the stack is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.items.push(value);
        Ok(())
    }

    /// Pushes `value`.
    ///
    /// # Panics
    /// Panics when the stack is full. A full stack during a tree walk means
    /// the walk is deeper than any balanced tree of that size can be.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.try_push(value).is_err() {
            error!(
                "bounded stack overflow at depth {}; tree height exceeds its balance bound",
                self.capacity
            );
            panic!("bounded stack overflow: capacity {} exceeded", self.capacity);
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// The most recently pushed value.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.items.last()
    }
}
