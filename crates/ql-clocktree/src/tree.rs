//! Tree arena (spec §9 supplement, pinned down in `SPEC_FULL.md` §5).
//!
//! "The tree as an arena": `Tree` owns a flat `Vec<NodeRecord>` addressed
//! by [`NodeId`], with parent/child relations stored as indices rather
//! than pointers — no cyclic ownership, matching the teacher's
//! recombining binomial tree (`ql-methods/src/lattice/binomial_tree.rs`),
//! which addresses nodes by `(step, index)` instead of parent/child
//! pointers. The tree is built once and never mutated in place (spec's
//! Non-goals exclude incremental re-inference after topology edits).

use crate::errors::{ensure_config, ClockTreeError, Result};

/// An index into a [`Tree`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Topology and sequence data for one node, supplied by the caller (tree
/// I/O and ancestral reconstruction are out of scope, spec §1).
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Leaf/internal node name, if any (used to match the date table).
    pub name: Option<String>,
    /// Parent index; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Child indices, in the order branch lengths were estimated.
    pub children: Vec<NodeId>,
    /// The node's (ancestral or observed) sequence.
    pub sequence: Vec<u8>,
}

/// A rooted phylogeny with per-node sequences, addressed by [`NodeId`].
///
/// Corresponds to the tree half of `TreeAnc`'s responsibilities (spec
/// §4.5/C6), minus the substitution model and `one_mutation` scale, which
/// live in [`crate::tree_anc::TreeAnc`].
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeRecord>,
    root: NodeId,
    postorder: Vec<NodeId>,
    preorder: Vec<NodeId>,
}

impl Tree {
    /// Build a tree from pre-built node records and validate it: exactly
    /// one root reachable from every node, no cycles, children agree with
    /// recorded parents.
    ///
    /// # Errors
    /// Returns [`ClockTreeError::Configuration`] if the topology is
    /// malformed (spec §7 kind 1: "tree without a root").
    pub fn new(nodes: Vec<NodeRecord>, root: NodeId) -> Result<Self> {
        ensure_config!(!nodes.is_empty(), "tree has no nodes");
        ensure_config!(root.0 < nodes.len(), "root index out of range");
        ensure_config!(
            nodes[root.0].parent.is_none(),
            "designated root has a parent"
        );
        for (i, n) in nodes.iter().enumerate() {
            for &c in &n.children {
                ensure_config!(
                    c.0 < nodes.len(),
                    "node {i} has an out-of-range child {c:?}"
                );
                ensure_config!(
                    nodes[c.0].parent == Some(NodeId(i)),
                    "child {c:?} does not list node {i} as its parent"
                );
            }
        }

        let mut tree = Tree {
            nodes,
            root,
            postorder: Vec::new(),
            preorder: Vec::new(),
        };
        tree.preorder = tree.compute_preorder();
        tree.postorder = tree.compute_postorder();
        if tree.preorder.len() != tree.nodes.len() {
            return Err(ClockTreeError::Configuration(
                "tree is not fully connected to the root (cycle or orphan subtree)".into(),
            ));
        }
        Ok(tree)
    }

    fn compute_preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &c in self.nodes[id.0].children.iter().rev() {
                stack.push(c);
            }
        }
        order
    }

    fn compute_postorder(&self) -> Vec<NodeId> {
        let mut order = self.compute_preorder();
        order.reverse();
        order
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the tree has no nodes (never true for a validated tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node's parent, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The node's children (empty for a leaf).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// `true` if the node has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// The node's name, if any.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].name.as_deref()
    }

    /// The node's sequence.
    pub fn sequence(&self, id: NodeId) -> &[u8] {
        &self.nodes[id.0].sequence
    }

    /// All node ids, children visited before their parents (spec §4.4.2:
    /// "go through the nodes from leaves towards the root").
    pub fn postorder(&self) -> &[NodeId] {
        &self.postorder
    }

    /// All node ids, parents visited before their children (spec
    /// §4.4.3/§4.4.4/§4.4.5: "ancestors first").
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(n_leaves: usize) -> Tree {
        let mut nodes = vec![NodeRecord {
            name: Some("root".into()),
            parent: None,
            children: (1..=n_leaves).map(NodeId).collect(),
            sequence: b"ACGT".to_vec(),
        }];
        for i in 0..n_leaves {
            nodes.push(NodeRecord {
                name: Some(format!("leaf{i}")),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: b"ACGT".to_vec(),
            });
        }
        Tree::new(nodes, NodeId(0)).unwrap()
    }

    #[test]
    fn postorder_visits_children_before_parent() {
        let t = star(3);
        let post = t.postorder();
        assert_eq!(post[post.len() - 1], NodeId(0));
    }

    #[test]
    fn preorder_visits_root_first() {
        let t = star(3);
        assert_eq!(t.preorder()[0], NodeId(0));
    }

    #[test]
    fn rejects_child_with_mismatched_parent_pointer() {
        let nodes = vec![
            NodeRecord {
                name: None,
                parent: None,
                children: vec![NodeId(1)],
                sequence: vec![],
            },
            NodeRecord {
                name: None,
                parent: None,
                children: vec![],
                sequence: vec![],
            },
        ];
        assert!(Tree::new(nodes, NodeId(0)).is_err());
    }

    #[test]
    fn rejects_orphan_subtree() {
        let nodes = vec![
            NodeRecord {
                name: None,
                parent: None,
                children: vec![],
                sequence: vec![],
            },
            NodeRecord {
                name: None,
                parent: None,
                children: vec![],
                sequence: vec![],
            },
        ];
        assert!(Tree::new(nodes, NodeId(0)).is_err());
    }
}
