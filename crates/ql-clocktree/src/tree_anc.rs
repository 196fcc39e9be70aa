//! `TreeAnc` adapter (spec §4.5/§6, "C6") — the read-only view of
//! topology, per-node sequences and the substitution model that the rest
//! of the engine treats as an external collaborator.
//!
//! Sequence alignment I/O, Newick parsing and ancestral-sequence
//! reconstruction are out of scope (spec §1 "Out of scope"): this
//! adapter is always handed a pre-built [`Tree`](crate::tree::Tree) and
//! already-resolved sequences, the way the teacher's pricing engines are
//! handed already-bootstrapped term structures rather than building them.

use crate::errors::{ClockTreeError, Result};
use crate::substitution_model::SubstitutionModel;
use crate::tree::{NodeId, Tree};
use ql_core::Real;

/// Everything the clock-tree engine needs from the ancestral-sequence
/// side of the pipeline, without depending on how sequences were
/// produced.
///
/// A concrete implementation only has to expose topology traversal
/// (delegated to its [`Tree`]), per-node sequences, a substitution model
/// and the `one_mutation` scale; `optimize_seq_and_branch_len` is the
/// single entry point the engine calls if ancestral sequences have not
/// yet been resolved (spec §4.4.1 step 2).
pub trait TreeAnc {
    /// The tree topology (pre/postorder traversal, parent/child lookup).
    fn tree(&self) -> &Tree;

    /// The substitution model used to score branch lengths.
    fn model(&self) -> &dyn SubstitutionModel;

    /// `1 / alignment_length`, the branch-length scale of a single
    /// substitution.
    fn one_mutation(&self) -> Real;

    /// `true` once every internal node has a resolved sequence.
    fn has_ancestral_sequences(&self) -> bool;

    /// Resolve ancestral sequences and branch lengths if not already
    /// done (spec §4.4.1 step 2: "If ancestral sequences are absent,
    /// request them from C6").
    ///
    /// Ancestral reconstruction itself is out of scope for this crate
    /// (spec §1); a real deployment wires this to an external
    /// reconstruction step before constructing the adapter. Calling this
    /// on an adapter that already has sequences is a no-op.
    fn optimize_seq_and_branch_len(&mut self) -> Result<()>;
}

/// An in-memory [`TreeAnc`] built from pre-resolved topology, sequences
/// and a substitution model — the only implementation this crate needs,
/// since ancestral reconstruction and alignment I/O are out of scope.
#[derive(Debug)]
pub struct InMemoryTreeAnc {
    tree: Tree,
    model: Box<dyn SubstitutionModel>,
    one_mutation: Real,
}

impl InMemoryTreeAnc {
    /// Build an adapter over an already-built tree (sequences live on its
    /// [`NodeRecord`](crate::tree::NodeRecord)s) and substitution model.
    ///
    /// # Errors
    /// Returns [`ClockTreeError::Configuration`] if any leaf has an empty
    /// sequence, which would make every branch-length likelihood
    /// uninformative.
    pub fn new(tree: Tree, model: Box<dyn SubstitutionModel>, one_mutation: Real) -> Result<Self> {
        for &id in tree.preorder() {
            if tree.is_leaf(id) && tree.sequence(id).is_empty() {
                return Err(ClockTreeError::Configuration(format!(
                    "leaf {:?} has no sequence",
                    tree.name(id)
                )));
            }
        }
        Ok(Self {
            tree,
            model,
            one_mutation,
        })
    }

    /// Borrow a single node's sequence directly (convenience used by
    /// [`crate::engine::ClockTreeEngine`] when building branch-length
    /// interpolators).
    pub fn sequence(&self, id: NodeId) -> &[u8] {
        self.tree.sequence(id)
    }
}

impl TreeAnc for InMemoryTreeAnc {
    fn tree(&self) -> &Tree {
        &self.tree
    }

    fn model(&self) -> &dyn SubstitutionModel {
        self.model.as_ref()
    }

    fn one_mutation(&self) -> Real {
        self.one_mutation
    }

    fn has_ancestral_sequences(&self) -> bool {
        self.tree
            .preorder()
            .iter()
            .all(|&id| !self.tree.sequence(id).is_empty())
    }

    fn optimize_seq_and_branch_len(&mut self) -> Result<()> {
        if self.has_ancestral_sequences() {
            return Ok(());
        }
        Err(ClockTreeError::Configuration(
            "ancestral sequence reconstruction is out of scope; supply resolved sequences \
             on every node before building InMemoryTreeAnc"
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution_model::JukesCantor;
    use crate::tree::NodeRecord;

    fn two_leaf_tree() -> Tree {
        let nodes = vec![
            NodeRecord {
                name: Some("root".into()),
                parent: None,
                children: vec![NodeId(1), NodeId(2)],
                sequence: b"ACGT".to_vec(),
            },
            NodeRecord {
                name: Some("a".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: b"ACGT".to_vec(),
            },
            NodeRecord {
                name: Some("b".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: b"ACGA".to_vec(),
            },
        ];
        Tree::new(nodes, NodeId(0)).unwrap()
    }

    #[test]
    fn rejects_empty_leaf_sequence() {
        let mut nodes = vec![
            NodeRecord {
                name: Some("root".into()),
                parent: None,
                children: vec![NodeId(1)],
                sequence: b"ACGT".to_vec(),
            },
            NodeRecord {
                name: Some("a".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: vec![],
            },
        ];
        nodes[0].children = vec![NodeId(1)];
        let tree = Tree::new(nodes, NodeId(0)).unwrap();
        assert!(InMemoryTreeAnc::new(tree, Box::new(JukesCantor), 0.25).is_err());
    }

    #[test]
    fn resolved_tree_reports_sequences_present() {
        let anc = InMemoryTreeAnc::new(two_leaf_tree(), Box::new(JukesCantor), 0.25).unwrap();
        assert!(anc.has_ancestral_sequences());
        assert_eq!(anc.model().name(), "Jukes-Cantor");
    }
}
