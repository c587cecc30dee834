//! # avl-rs
//!
//! An ordered map and set backed by an AVL tree whose insert and erase are
//! fully iterative.
//!
//! Nodes store two child links and a tri-state balance marker, nothing else:
//! no parent pointers and no heights. Insert and erase each make a single
//! top-down pass that remembers the one ancestor where rebalancing has to
//! start, so no recursion and no path stack are needed.
//!
//! ## Example
//!
//! ```rust
//! use avl_rs::{AvlSet, Order};
//!
//! let mut set: AvlSet<i32> = AvlSet::new();
//! for k in [33, 20, 46, 12, 28] {
//!     assert!(set.insert(k, ()));
//! }
//! assert!(!set.insert(20, ()));
//! assert!(set.contains(&28));
//!
//! let mut desc = Vec::new();
//! set.enumerate(Order::Descending, |k, _| {
//!     desc.push(*k);
//!     true
//! });
//! assert_eq!(desc, [46, 33, 28, 20, 12]);
//! ```
//!
//! ## Layout
//!
//! - [`Tree`] is the container. It delegates shape decisions to a
//!   [`Balancer`] chosen at compile time ([`AvlBalancer`]) and node storage
//!   to a [`NodeAlloc`] ([`Arena`]).
//! - [`BoundedStack`] is the fixed-depth stack used by enumeration and
//!   `clear`, sized from the AVL height bound.

#![deny(unsafe_code)]

pub mod alloc;
pub mod balancer;
mod debug;
mod error;
pub mod node;
pub mod raw;
pub mod stack;
pub mod tree;

pub use alloc::{Arena, NodeAlloc};
pub use balancer::{AvlBalancer, Balancer};
pub use error::{Error, Result};
pub use node::{Balance, Dir, Link, Node, NodeId, Slot};
pub use raw::RawTree;
pub use stack::{height_bound, BoundedStack};
pub use tree::{AvlMap, AvlSet, Config, Order, Tree};

#[cfg(test)]
mod proptests;
