//! Debug utilities: invariant checks and a structural dump.
//!
//! These walk the node graph with heap-backed stacks so they keep working on
//! a tree whose height has already gone out of bounds.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::alloc::NodeAlloc;
use crate::node::{Balance, Dir, NodeId};
use crate::tree::Tree;

/// Per-node subtree heights.
struct Heights {
    /// `(node, left height, right height)` in post-order.
    nodes: Vec<(NodeId, usize, usize)>,
    root: usize,
    /// A node was reached twice; the graph is not a tree.
    shared: Option<NodeId>,
}

impl<K, V, B, A: NodeAlloc<K, V>> Tree<K, V, B, A> {
    fn measure(&self) -> Heights {
        let raw = &self.raw;
        let mut heights: HashMap<NodeId, usize> = HashMap::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut nodes = Vec::new();
        let mut shared = None;

        let mut stack: Vec<(NodeId, bool)> = Vec::new();
        if let Some(root) = raw.root() {
            stack.push((root, false));
        }
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                let side = |dir| {
                    raw.child(id, dir)
                        .and_then(|c| heights.get(&c).copied())
                        .unwrap_or(0)
                };
                let (hl, hr) = (side(Dir::Left), side(Dir::Right));
                heights.insert(id, 1 + hl.max(hr));
                nodes.push((id, hl, hr));
                continue;
            }
            if !seen.insert(id) {
                shared.get_or_insert(id);
                continue;
            }
            stack.push((id, true));
            for dir in [Dir::Right, Dir::Left] {
                if let Some(child) = raw.child(id, dir) {
                    stack.push((child, false));
                }
            }
        }

        let root = raw
            .root()
            .and_then(|r| heights.get(&r).copied())
            .unwrap_or(0);
        Heights {
            nodes,
            root,
            shared,
        }
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        self.measure().root
    }

    /// Calls `check(left_height, right_height)` for every node, children first.
    pub fn check_heights<F: FnMut(usize, usize)>(&self, mut check: F) {
        for (_, hl, hr) in self.measure().nodes {
            check(hl, hr);
        }
    }
}

impl<K: Ord + fmt::Debug, V, B, A: NodeAlloc<K, V>> Tree<K, V, B, A> {
    /// Verifies every structural invariant and lists the violations found.
    ///
    /// An empty list means the tree is a valid AVL tree: heights differ by at
    /// most one everywhere, balance markers match, keys are strictly
    /// increasing in order, and the reachable node count equals `len()`.
    pub fn verify_integrity(&self) -> Vec<String> {
        let raw = &self.raw;
        let mut issues = Vec::new();
        let measured = self.measure();

        if let Some(id) = measured.shared {
            issues.push(format!("node {id:?} is reachable through more than one link"));
            return issues;
        }

        for &(id, hl, hr) in &measured.nodes {
            let key = &raw.node(id).key;
            if hl.abs_diff(hr) > 1 {
                issues.push(format!("node {key:?}: subtree heights {hl} and {hr}"));
            }
            let expected = match hl.cmp(&hr) {
                std::cmp::Ordering::Equal => Balance::Balanced,
                std::cmp::Ordering::Greater => Balance::LeftHeavy,
                std::cmp::Ordering::Less => Balance::RightHeavy,
            };
            let stored = raw.balance(id);
            if stored != expected {
                issues.push(format!("node {key:?}: marked {stored:?}, heights say {expected:?}"));
            }
        }

        if measured.nodes.len() != self.len() {
            issues.push(format!(
                "{} reachable nodes but len() is {}",
                measured.nodes.len(),
                self.len()
            ));
        }

        // In-order walk for key ordering.
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = raw.root();
        let mut prev: Option<&K> = None;
        loop {
            while let Some(id) = cur {
                stack.push(id);
                cur = raw.child(id, Dir::Left);
            }
            let Some(id) = stack.pop() else { break };
            let key = &raw.node(id).key;
            if let Some(p) = prev {
                if p >= key {
                    issues.push(format!("key {key:?} follows {p:?} in order"));
                }
            }
            prev = Some(key);
            cur = raw.child(id, Dir::Right);
        }

        issues
    }
}

impl<K: fmt::Display, V, B, A: NodeAlloc<K, V>> Tree<K, V, B, A> {
    /// Writes the tree as a Graphviz digraph, one line per node.
    ///
    /// ```text
    /// digraph BST {
    /// "2" -> { "1" "3" }
    /// "1" -> { }
    /// "3" -> { }
    /// }
    /// ```
    pub fn dump_graphviz<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let raw = &self.raw;
        writeln!(out, "digraph BST {{")?;
        let mut stack: Vec<NodeId> = raw.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = raw.node(id);
            write!(out, "\"{}\" -> {{ ", node.key)?;
            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = node.link(dir) {
                    write!(out, "\"{}\" ", raw.node(child).key)?;
                }
            }
            writeln!(out, "}}")?;
            stack.extend(node.link(Dir::Right));
            stack.extend(node.link(Dir::Left));
        }
        writeln!(out, "}}")
    }
}
