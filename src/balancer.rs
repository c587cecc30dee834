//! Balancing policies.
//!
//! A [`Balancer`] owns the shape of the tree: it links new nodes, unlinks
//! erased ones, and performs whatever rotations keep the tree within its
//! height bound. It is stateless and chosen at compile time through the
//! tree's type parameter.
//!
//! [`AvlBalancer`] maintains the AVL invariant iteratively in a single
//! top-down pass, with no parent links and no stored heights.

use std::borrow::Borrow;
use std::cmp::Ordering;

use log::trace;

use crate::alloc::NodeAlloc;
use crate::error::Result;
use crate::node::{Balance, Dir, NodeId, Slot};
use crate::raw::RawTree;

/// Structural policy for a binary search tree.
pub trait Balancer {
    /// Links a node for `key` unless an equivalent key is present.
    ///
    /// Returns `Ok(None)` for a duplicate, leaving the tree untouched. The node
    /// is allocated before any link is rewritten, so an allocation error also
    /// leaves the tree untouched.
    fn insert<K, V, A>(tree: &mut RawTree<K, V, A>, key: K, value: V) -> Result<Option<NodeId>>
    where
        K: Ord,
        A: NodeAlloc<K, V>;

    /// Unlinks the node whose key equals `key` and returns its id.
    ///
    /// The returned node is detached but still allocated; the caller releases it.
    fn erase<K, V, A, Q>(tree: &mut RawTree<K, V, A>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        A: NodeAlloc<K, V>;
}

/// AVL balancing with at most one rotation per insert.
#[derive(Clone, Copy, Debug, Default)]
pub struct AvlBalancer;

impl AvlBalancer {
    /// Single rotation at `slot`; both rotated nodes end up balanced.
    fn avl_rotate2<K, V, A: NodeAlloc<K, V>>(
        tree: &mut RawTree<K, V, A>,
        slot: Slot,
        dir: Dir,
    ) -> Option<NodeId> {
        let top = tree.occupied(slot);
        tree.set_balance(top, Balance::Balanced);
        let rest = tree.rotate2(slot, dir);
        let promoted = tree.occupied(slot);
        tree.set_balance(promoted, Balance::Balanced);
        rest
    }

    /// Double rotation at `slot`.
    ///
    /// `third` is the side of the promoted middle node that is taller: on
    /// insert, the side the new key lies on; on erase, the middle node's own
    /// balance. `None` means both sides are equal and every rotated node ends
    /// up balanced.
    ///
    /// Returns the subtree holding the taller side, whose nodes may still need
    /// their markers updated on insert.
    fn avl_rotate3<K, V, A: NodeAlloc<K, V>>(
        tree: &mut RawTree<K, V, A>,
        slot: Slot,
        dir: Dir,
        third: Option<Dir>,
    ) -> Option<NodeId> {
        let b = tree.occupied(slot);
        let f = tree
            .child(b, dir)
            .expect("double rotation needs a child on the rotation side");
        let d = tree
            .child(f, dir.opposite())
            .expect("double rotation needs an inner grandchild");
        let c = tree.child(d, dir.opposite());
        let e = tree.child(d, dir);

        tree.set_balance(b, Balance::Balanced);
        tree.set_balance(f, Balance::Balanced);
        tree.set_balance(d, Balance::Balanced);

        tree.rotate3(slot, dir);

        match third {
            None => None,
            Some(side) if side == dir => {
                // E was the taller half and now sits under F; B lost it.
                tree.set_balance(b, Balance::heavy(dir.opposite()));
                e
            }
            Some(_) => {
                // C was the taller half and now sits under B; F lost it.
                tree.set_balance(f, Balance::heavy(dir));
                c
            }
        }
    }
}

impl Balancer for AvlBalancer {
    fn insert<K, V, A>(tree: &mut RawTree<K, V, A>, key: K, value: V) -> Result<Option<NodeId>>
    where
        K: Ord,
        A: NodeAlloc<K, V>,
    {
        // Stage 1: find where the key belongs, remembering the deepest
        // unbalanced ancestor. Only that node's subtree can go out of balance.
        let mut slot = Slot::Root;
        let mut pivot = Slot::Root;
        let mut cur = tree.root();
        while let Some(id) = cur {
            let node = tree.node(id);
            let dir = match key.cmp(&node.key) {
                Ordering::Equal => return Ok(None),
                ord => Dir::of(ord),
            };
            if !node.balance.is_balanced() {
                pivot = slot;
            }
            slot = Slot::Child(id, dir);
            cur = node.link(dir);
        }

        let new = tree.alloc_leaf(key, value)?;
        tree.set_link(slot, Some(new));

        // Stage 2: rebalance at the pivot.
        let top = tree.occupied(pivot);
        let mut path = Some(top);
        if let Some(heavy) = tree.balance(top).heavy_side() {
            let first = tree.step_toward(top, new);
            if first != heavy {
                // Took the shorter side.
                tree.set_balance(top, Balance::Balanced);
                path = tree.child(top, first);
            } else {
                let child = tree
                    .child(top, first)
                    .expect("heavy side of a node is never empty");
                let second = tree.step_toward(child, new);
                if second == first {
                    trace!("insert: single rotation {first:?}");
                    path = Self::avl_rotate2(tree, pivot, first);
                } else {
                    let middle = tree
                        .child(child, second)
                        .expect("search path continues through the middle node");
                    // No third step when the middle node is the new leaf.
                    let third = (middle != new).then(|| tree.step_toward(middle, new));
                    trace!("insert: double rotation {first:?}/{second:?}");
                    path = Self::avl_rotate3(tree, pivot, first, third);
                }
            }
        }

        // Stage 3: every node between the fix-up point and the new leaf was
        // balanced and now leans toward the new key.
        while let Some(id) = path {
            if id == new {
                break;
            }
            let dir = tree.step_toward(id, new);
            tree.set_balance(id, Balance::heavy(dir));
            path = tree.child(id, dir);
        }

        Ok(Some(new))
    }

    fn erase<K, V, A, Q>(tree: &mut RawTree<K, V, A>, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        A: NodeAlloc<K, V>,
    {
        // Stage 1: walk to the node with at most one child that ends the path
        // through the key (the key's node or its in-order successor). Remember
        // where the key's node sits and the deepest ancestor that can absorb
        // a shrink below it without changing its own height.
        let mut slot = Slot::Root;
        let mut top = Slot::Root;
        let mut target = None;
        let mut dir = Dir::Right;
        let mut cur = tree.root();
        while let Some(id) = cur {
            let node = tree.node(id);
            let ord = key.cmp(node.key.borrow());
            dir = Dir::of(ord);
            if ord == Ordering::Equal {
                target = Some(slot);
            }
            let Some(next) = node.link(dir) else {
                break;
            };
            let absorbs = match node.balance.heavy_side() {
                None => true,
                Some(heavy) if heavy == dir.opposite() => node
                    .link(heavy)
                    .is_some_and(|sibling| tree.balance(sibling).is_balanced()),
                Some(_) => false,
            };
            if absorbs {
                top = slot;
            }
            slot = Slot::Child(id, dir);
            cur = Some(next);
        }
        let mut target_slot = target?;
        let target_id = tree.occupied(target_slot);

        // Stage 2: from the absorbing ancestor down to the end of the path,
        // account for one side losing a level.
        let mut at = top;
        loop {
            let id = tree.occupied(at);
            let step = Dir::of(key.cmp(tree.node(id).key.borrow()));
            if tree.child(id, step).is_none() {
                break;
            }
            let other = step.opposite();
            match tree.balance(id).heavy_side() {
                None => tree.set_balance(id, Balance::heavy(other)),
                Some(heavy) if heavy == step => tree.set_balance(id, Balance::Balanced),
                Some(_) => {
                    let sibling = tree
                        .child(id, other)
                        .expect("heavy side of a node is never empty");
                    match tree.balance(sibling).heavy_side() {
                        Some(lean) if lean == step => {
                            let middle = tree
                                .child(sibling, step)
                                .expect("heavy side of a node is never empty");
                            let third = tree.balance(middle).heavy_side();
                            trace!("erase: double rotation {other:?}");
                            Self::avl_rotate3(tree, at, other, third);
                        }
                        None => {
                            trace!("erase: single rotation {other:?}, height kept");
                            Self::avl_rotate2(tree, at, other);
                            tree.set_balance(id, Balance::heavy(other));
                            let promoted = tree.occupied(at);
                            tree.set_balance(promoted, Balance::heavy(step));
                        }
                        Some(_) => {
                            trace!("erase: single rotation {other:?}");
                            Self::avl_rotate2(tree, at, other);
                        }
                    }
                    // The rotated node moved one level down; if it is the
                    // target, follow it.
                    if id == target_id {
                        target_slot = Slot::Child(tree.occupied(at), step);
                    }
                }
            }
            at = Slot::Child(id, step);
        }

        // Stage 3: splice. The end of the path has no child toward the key;
        // its other child takes its place, and it takes the target's place.
        let last = tree.occupied(at);
        let orphan = tree.child(last, dir.opposite());
        if last == target_id {
            tree.set_link(at, orphan);
        } else {
            tree.set_link(target_slot, Some(last));
            tree.set_link(at, orphan);
            let (links, balance) = {
                let t = tree.node(target_id);
                (t.links, t.balance)
            };
            let moved = tree.node_mut(last);
            moved.links = links;
            moved.balance = balance;
        }
        Some(target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Arena;
    use crate::node::Link;
    use crate::proptests::for_each_permutation;

    type Raw = RawTree<i32, (), Arena<i32, ()>>;

    fn height(t: &Raw, link: Link) -> usize {
        link.map_or(0, |id| {
            1 + height(t, t.child(id, Dir::Left)).max(height(t, t.child(id, Dir::Right)))
        })
    }

    /// Checks heights, balance markers and ordering; returns the key list.
    fn check(t: &Raw) -> Vec<i32> {
        fn walk(t: &Raw, link: Link, out: &mut Vec<i32>) {
            let Some(id) = link else { return };
            let l = t.child(id, Dir::Left);
            let r = t.child(id, Dir::Right);
            let (hl, hr) = (height(t, l), height(t, r));
            let expected = match hl.cmp(&hr) {
                Ordering::Equal => Balance::Balanced,
                Ordering::Greater => Balance::LeftHeavy,
                Ordering::Less => Balance::RightHeavy,
            };
            assert!(hl.abs_diff(hr) <= 1, "node {} heights {hl}/{hr}", t.node(id).key);
            assert_eq!(t.balance(id), expected, "marker of {}", t.node(id).key);
            walk(t, l, out);
            out.push(t.node(id).key);
            walk(t, r, out);
        }
        let mut out = Vec::new();
        walk(t, t.root(), &mut out);
        assert!(out.windows(2).all(|w| w[0] < w[1]), "out of order: {out:?}");
        out
    }

    fn insert(t: &mut Raw, k: i32) -> bool {
        AvlBalancer::insert(t, k, ()).unwrap().is_some()
    }

    fn erase(t: &mut Raw, k: i32) -> bool {
        match AvlBalancer::erase(t, &k) {
            Some(id) => {
                assert!(t.nodes.release(id).key == k);
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_insert_single_rotation() {
        let mut t = Raw::new(Arena::new());
        for k in [1, 2, 3] {
            assert!(insert(&mut t, k));
        }
        assert_eq!(check(&t), vec![1, 2, 3]);
        assert_eq!(t.node(t.root().unwrap()).key, 2);
    }

    #[test]
    fn test_insert_double_rotation_middle_is_new_leaf() {
        let mut t = Raw::new(Arena::new());
        for k in [3, 1, 2] {
            insert(&mut t, k);
        }
        assert_eq!(check(&t), vec![1, 2, 3]);
        assert_eq!(t.node(t.root().unwrap()).key, 2);
    }

    #[test]
    fn test_insert_double_rotation_with_third_step() {
        // 20 leans right; the new key turns left at 50 and then continues
        // past 40 on either side.
        for last in [45, 35] {
            let mut t = Raw::new(Arena::new());
            for k in [20, 10, 50, 40, 60, last] {
                insert(&mut t, k);
            }
            check(&t);
            assert_eq!(t.node(t.root().unwrap()).key, 40);
        }
    }

    #[test]
    fn test_insert_duplicate_is_noop() {
        let mut t = Raw::new(Arena::new());
        insert(&mut t, 1);
        insert(&mut t, 2);
        let before = t.balance(t.root().unwrap());
        assert!(!insert(&mut t, 2));
        assert_eq!(t.balance(t.root().unwrap()), before);
        assert_eq!(t.nodes.live(), 2);
    }

    #[test]
    fn test_erase_leaf_root_and_missing() {
        let mut t = Raw::new(Arena::new());
        assert!(!erase(&mut t, 1));
        insert(&mut t, 1);
        assert!(!erase(&mut t, 2));
        assert!(erase(&mut t, 1));
        assert_eq!(t.root(), None);
        assert_eq!(t.nodes.live(), 0);
    }

    #[test]
    fn test_erase_node_with_two_children() {
        let mut t = Raw::new(Arena::new());
        for k in [4, 2, 6, 1, 3, 5, 7] {
            insert(&mut t, k);
        }
        assert!(erase(&mut t, 4));
        assert_eq!(check(&t), vec![1, 2, 3, 5, 6, 7]);
        assert_eq!(t.node(t.root().unwrap()).key, 5);
        assert!(erase(&mut t, 2));
        assert_eq!(check(&t), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_erase_rotation_cases() {
        // Sibling balanced: single rotation keeps the subtree height.
        let mut t = Raw::new(Arena::new());
        for k in [2, 1, 4, 3, 5] {
            insert(&mut t, k);
        }
        erase(&mut t, 1);
        assert_eq!(check(&t), vec![2, 3, 4, 5]);

        // Sibling leaning away: plain single rotation.
        let mut t = Raw::new(Arena::new());
        for k in [2, 1, 3, 4] {
            insert(&mut t, k);
        }
        erase(&mut t, 1);
        assert_eq!(check(&t), vec![2, 3, 4]);

        // Sibling leaning toward the shrink: double rotation.
        let mut t = Raw::new(Arena::new());
        for k in [2, 1, 4, 3] {
            insert(&mut t, k);
        }
        erase(&mut t, 1);
        assert_eq!(check(&t), vec![2, 3, 4]);
        assert_eq!(t.node(t.root().unwrap()).key, 3);
    }

    #[test]
    fn test_erase_target_moved_by_rotation() {
        // The target sits at the rotation point and has two children.
        let mut t = Raw::new(Arena::new());
        for k in [8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15, 16] {
            insert(&mut t, k);
        }
        for k in [12, 8, 13, 9, 4] {
            assert!(erase(&mut t, k));
            check(&t);
        }
    }

    #[test]
    fn test_exhaustive_small_orders() {
        for_each_permutation(&[0, 1, 2, 3, 4, 5], |order| {
            let mut t = Raw::new(Arena::new());
            for &k in order {
                insert(&mut t, k);
                check(&t);
            }
            for &k in order.iter().rev() {
                assert!(erase(&mut t, k));
                check(&t);
            }
            for &k in order {
                insert(&mut t, k);
            }
            for &k in order {
                assert!(erase(&mut t, k));
                check(&t);
            }
            assert_eq!(t.root(), None);
        });
    }
}
