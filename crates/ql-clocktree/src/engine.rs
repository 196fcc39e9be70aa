//! `ClockTreeEngine` (spec §4.4, "C5") — orchestrates date-constraint
//! initialization and the two message passes over the tree.
//!
//! Mirrors the shape of the teacher's bootstrapping engines (e.g.
//! `PiecewiseYieldCurve`'s iterative construction): a single entry point
//! (`run`) that walks a fixed sequence of phases, each phase a postorder
//! or preorder sweep over the tree, writing into a parallel
//! `Vec<ClockNode>` rather than mutating the topology.

use crate::branch_len_interpolator::BranchLenInterpolator;
use crate::clock_node::ClockNode;
use crate::config::EngineConfig;
use crate::date_conversion::{render_date_string, DateConversion};
use crate::date_table::DateTable;
use crate::distribution::Distribution;
use crate::errors::{ClockTreeError, Result};
use crate::node_interpolator::NodeInterpolator;
use crate::tree::NodeId;
use crate::tree_anc::TreeAnc;
use ql_core::Real;

/// Drives the full molecular-clock inference for one tree.
///
/// Owns the per-node [`ClockNode`] state array; the topology and
/// sequences live in the [`TreeAnc`] implementation passed to
/// [`ClockTreeEngine::run`]. Constructed with an explicit
/// [`EngineConfig`] rather than reading global/static configuration
/// (`SPEC_FULL.md` §1 "Configuration").
#[derive(Debug)]
pub struct ClockTreeEngine {
    cfg: EngineConfig,
    nodes: Vec<ClockNode>,
    date_conversion: Option<DateConversion>,
}

impl ClockTreeEngine {
    /// A fresh engine with no per-node state yet computed.
    pub fn new(cfg: EngineConfig, n_nodes: usize) -> Self {
        Self {
            cfg,
            nodes: vec![ClockNode::new(); n_nodes],
            date_conversion: None,
        }
    }

    /// The fitted date/branch-length calibration, available after
    /// [`ClockTreeEngine::run`].
    pub fn date_conversion(&self) -> Option<&DateConversion> {
        self.date_conversion.as_ref()
    }

    /// Read-only access to one node's final state.
    pub fn node(&self, id: NodeId) -> &ClockNode {
        &self.nodes[id.0]
    }

    /// Run every phase of spec §4.4 in order: initialization, upward
    /// pass, downward pass, finalization, calendar conversion.
    pub fn run<A: TreeAnc>(
        &mut self,
        anc: &A,
        date_table: &DateTable,
        slope_hint: Option<Real>,
        today: Real,
    ) -> Result<()> {
        self.init_date_constraints(anc, date_table, slope_hint, today)?;
        self.ml_t_leaves_root(anc)?;
        self.ml_t_root_leaves(anc)?;
        self.set_final_dates(anc)?;
        self.convert_dates(today)?;
        Ok(())
    }

    /// Phase 4.4.1: attach dates, build branch-length interpolators, fit
    /// the calibration, seed leaf messages.
    fn init_date_constraints<A: TreeAnc>(
        &mut self,
        anc: &A,
        date_table: &DateTable,
        slope_hint: Option<Real>,
        today: Real,
    ) -> Result<()> {
        let tree = anc.tree();

        // Step 1: attach numdate_given by name match.
        for &id in tree.preorder() {
            if let Some(name) = tree.name(id) {
                self.nodes[id.0].numdate_given = date_table.get(name);
            }
        }

        // Step 3: build branch_length_interpolator for every non-root node.
        for &id in tree.preorder() {
            let Some(parent) = tree.parent(id) else {
                continue;
            };
            let interp = BranchLenInterpolator::new(
                tree.sequence(id),
                tree.sequence(parent),
                anc.model(),
                anc.one_mutation(),
                &self.cfg,
            )?;
            self.nodes[id.0].clock_length = Some(interp.peak());
            self.nodes[id.0].branch_length_interpolator = Some(interp.into_distribution());
        }

        // Step 4: fit DateConversion over dated, non-bad-branch leaves.
        // root_to_tip distance is approximated as the sum of ML branch
        // peaks from the root to each dated leaf.
        let mut dates = Vec::new();
        let mut distances = Vec::new();
        let peak = |nodes: &[ClockNode], id: NodeId| -> Real {
            nodes[id.0]
                .branch_length_interpolator
                .as_ref()
                .map(Distribution::peak_pos)
                .unwrap_or(0.0)
        };
        for &id in tree.preorder() {
            if !tree.is_leaf(id) {
                continue;
            }
            if self.nodes[id.0].bad_branch {
                continue;
            }
            let Some(numdate) = self.nodes[id.0].numdate_given else {
                continue;
            };
            let mut distance = 0.0;
            let mut cur = id;
            while let Some(parent) = tree.parent(cur) {
                distance += peak(&self.nodes, cur);
                cur = parent;
            }
            dates.push(numdate);
            distances.push(distance);
        }
        let date_conversion = DateConversion::from_observations(&dates, &distances, slope_hint)?;
        self.date_conversion = Some(date_conversion);

        // Step 5/6: seed abs_t and msg_to_parent for dated leaves; demote
        // dated-but-bad-branch leaves.
        for &id in tree.preorder() {
            let node = &mut self.nodes[id.0];
            if node.numdate_given.is_some() && node.bad_branch {
                tracing::warn!(node = ?id, "dated leaf is also marked bad_branch; demoting to undated");
                node.numdate_given = None;
            }
            if let (Some(numdate), false) = (node.numdate_given, node.bad_branch) {
                let abs_t = (today - numdate) * date_conversion.slope.abs();
                node.abs_t = Some(abs_t);
                node.msg_to_parent = Some(Distribution::delta(abs_t, 1.0));
            } else {
                node.abs_t = None;
                node.msg_to_parent = None;
            }
        }
        Ok(())
    }

    /// Phase 4.4.2: postorder upward pass, `_ml_t_leaves_root`.
    fn ml_t_leaves_root<A: TreeAnc>(&mut self, anc: &A) -> Result<()> {
        let tree = anc.tree();
        for &id in tree.postorder() {
            if tree.is_leaf(id) {
                continue;
            }
            let mut contributions: Vec<(NodeId, Distribution)> = Vec::new();
            for &child in tree.children(id) {
                let Some(child_msg) = self.nodes[child.0].msg_to_parent.clone() else {
                    continue;
                };
                let branch_len = self.nodes[child.0]
                    .branch_length_interpolator
                    .clone()
                    .expect("non-root node always has a branch_length_interpolator");
                let sent = if child_msg.is_delta() {
                    branch_len.shifted_x(child_msg.peak_pos())
                } else {
                    NodeInterpolator::convolve(&child_msg, &branch_len, false, &self.cfg)?
                };
                contributions.push((child, sent));
            }
            if contributions.is_empty() {
                self.nodes[id.0].msg_to_parent = None;
                continue;
            }
            for (child, dist) in &contributions {
                self.nodes[id.0].msgs_from_leaves.insert(*child, dist.clone());
            }
            let refs: Vec<&Distribution> = contributions.iter().map(|(_, d)| d).collect();
            let product = NodeInterpolator::multiply(&refs, &self.cfg)?;
            if product.is_dead() {
                return Err(ClockTreeError::Numeric {
                    node: id,
                    detail: "upward message product has empty support".into(),
                });
            }
            self.nodes[id.0].msg_to_parent = Some(product);
        }
        Ok(())
    }

    /// Phase 4.4.3: preorder downward pass, `_ml_t_root_leaves`.
    fn ml_t_root_leaves<A: TreeAnc>(&mut self, anc: &A) -> Result<()> {
        let tree = anc.tree();
        for &id in tree.preorder() {
            if id == tree.root() {
                self.nodes[id.0].msg_from_parent = None;
                continue;
            }
            let parent = tree.parent(id).expect("non-root node has a parent");

            let mut complementary: Vec<Distribution> = self.nodes[parent.0]
                .msgs_from_leaves
                .iter()
                .filter(|(&k, _)| k != id)
                .map(|(_, v)| v.clone())
                .collect();
            if let Some(from_parent) = &self.nodes[parent.0].msg_from_parent {
                complementary.push(from_parent.clone());
            }

            let branch_len = self.nodes[id.0]
                .branch_length_interpolator
                .clone()
                .expect("non-root node always has a branch_length_interpolator");

            let msg = if complementary.is_empty() {
                branch_len
            } else {
                let refs: Vec<&Distribution> = complementary.iter().collect();
                let m = NodeInterpolator::multiply(&refs, &self.cfg)?;
                NodeInterpolator::convolve(&m, &branch_len, true, &self.cfg)?
            };
            self.nodes[id.0].msg_from_parent = Some(msg);
        }
        Ok(())
    }

    /// Phase 4.4.4: preorder finalization, `_set_final_dates`.
    fn set_final_dates<A: TreeAnc>(&mut self, anc: &A) -> Result<()> {
        let tree = anc.tree();
        for &id in tree.preorder() {
            if id == tree.root() {
                let msg = self.nodes[id.0]
                    .msg_to_parent
                    .clone()
                    .ok_or_else(|| ClockTreeError::Numeric {
                        node: id,
                        detail: "root has no constraining message; tree has no dated leaves"
                            .into(),
                    })?;
                self.nodes[id.0].marginal_lh = Some(msg.clone());
                self.nodes[id.0].joint_lh = Some(msg.clone());
                self.nodes[id.0].time_before_present = Some(msg.peak_pos());
                self.nodes[id.0].branch_length = Some(anc.one_mutation());
                continue;
            }

            let parent = tree.parent(id).expect("non-root node has a parent");
            let msg_to_parent = self.nodes[id.0].msg_to_parent.clone();
            let msg_from_parent = self.nodes[id.0].msg_from_parent.clone();

            if let (Some(a), Some(b)) = (&msg_to_parent, &msg_from_parent) {
                let marginal = NodeInterpolator::multiply(&[a, b], &self.cfg)?;
                self.nodes[id.0].marginal_lh = Some(marginal);
            } else {
                self.nodes[id.0].marginal_lh = msg_to_parent.clone().or(msg_from_parent.clone());
            }

            let parent_time = self.nodes[parent.0]
                .time_before_present
                .expect("preorder guarantees parent is finalized first");
            let branch_len = self.nodes[id.0]
                .branch_length_interpolator
                .clone()
                .expect("non-root node always has a branch_length_interpolator");
            let res = branch_len.shifted_x(-parent_time).x_rescale(-1.0);

            let joint = match &msg_to_parent {
                Some(m) => NodeInterpolator::multiply(&[m, &res], &self.cfg)?,
                None => res,
            };
            let time_before_present = joint.peak_pos();
            self.nodes[id.0].joint_lh = Some(joint);
            self.nodes[id.0].time_before_present = Some(time_before_present);

            let branch_length = parent_time - time_before_present;
            if branch_length < -1e-6 && !self.nodes[id.0].bad_branch {
                tracing::warn!(
                    node = ?id,
                    branch_length,
                    "negative branch length inferred on a non-bad branch"
                );
            }
            self.nodes[id.0].branch_length = Some(branch_length);
        }
        Ok(())
    }

    /// Phase 4.4.5: calendar conversion, `convert_dates`.
    fn convert_dates(&mut self, today: Real) -> Result<()> {
        let date_conversion = self
            .date_conversion
            .ok_or_else(|| ClockTreeError::Configuration("calibration not yet fit".into()))?;
        for node in &mut self.nodes {
            let Some(t) = node.time_before_present else {
                continue;
            };
            let years_bp = date_conversion.get_date(t);
            let numdate = today - years_bp;
            if numdate > today + 1e-6 {
                tracing::warn!(numdate, today, "inferred date lies in the future");
            }
            node.numdate = Some(numdate);
            node.date_string = Some(render_date_string(numdate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution_model::JukesCantor;
    use crate::tree::{NodeRecord, Tree};
    use crate::tree_anc::InMemoryTreeAnc;
    use approx::assert_relative_eq;

    fn build_star(seq_a: &[u8], seq_b: &[u8]) -> InMemoryTreeAnc {
        let root_seq = seq_a.to_vec();
        let nodes = vec![
            NodeRecord {
                name: Some("root".into()),
                parent: None,
                children: vec![NodeId(1), NodeId(2)],
                sequence: root_seq,
            },
            NodeRecord {
                name: Some("a".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: seq_a.to_vec(),
            },
            NodeRecord {
                name: Some("b".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: seq_b.to_vec(),
            },
        ];
        let tree = Tree::new(nodes, NodeId(0)).unwrap();
        InMemoryTreeAnc::new(tree, Box::new(JukesCantor), 1.0 / seq_a.len() as Real).unwrap()
    }

    /// Three-leaf star (`a`, `b`, `c`), root sequence equal to `seq_a`, used
    /// by the bad-branch scenario where a third leaf is needed so two
    /// dated, non-bad leaves remain after one is excluded.
    fn build_star3(seq_a: &[u8], seq_b: &[u8], seq_c: &[u8]) -> InMemoryTreeAnc {
        let root_seq = seq_a.to_vec();
        let nodes = vec![
            NodeRecord {
                name: Some("root".into()),
                parent: None,
                children: vec![NodeId(1), NodeId(2), NodeId(3)],
                sequence: root_seq,
            },
            NodeRecord {
                name: Some("a".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: seq_a.to_vec(),
            },
            NodeRecord {
                name: Some("b".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: seq_b.to_vec(),
            },
            NodeRecord {
                name: Some("c".into()),
                parent: Some(NodeId(0)),
                children: vec![],
                sequence: seq_c.to_vec(),
            },
        ];
        let tree = Tree::new(nodes, NodeId(0)).unwrap();
        InMemoryTreeAnc::new(tree, Box::new(JukesCantor), 1.0 / seq_a.len() as Real).unwrap()
    }

    #[test]
    fn two_dated_leaves_infer_a_root_between_them() {
        let seq_a = b"ACGTACGTACGTACGTACGTACGTACGTACGT";
        let seq_b = b"ACGAACGTACGTACGTACGTACGTACGTACGT";
        let anc = build_star(seq_a, seq_b);
        let date_table = DateTable::parse("a,2000.0\nb,2005.0\n");

        let mut engine = ClockTreeEngine::new(EngineConfig::default(), anc.tree().len());
        engine.run(&anc, &date_table, None, 2010.0).unwrap();

        // The root is an ancestor of both leaves, so it must not postdate
        // either of them (spec's preorder date-monotonicity invariant).
        let root = engine.node(anc.tree().root());
        let leaf_a = engine.node(NodeId(1));
        let leaf_b = engine.node(NodeId(2));
        assert!(root.time_before_present.unwrap() >= leaf_a.time_before_present.unwrap() - 1e-6);
        assert!(root.time_before_present.unwrap() >= leaf_b.time_before_present.unwrap() - 1e-6);
    }

    #[test]
    fn bad_branch_leaf_does_not_constrain_root() {
        // Three leaves so two dated, non-bad leaves remain to calibrate
        // against once `b` is excluded (spec Scenario 3).
        let seq_a = b"ACGTACGTACGTACGTACGTACGTACGTACGT";
        let seq_c = b"ACGAACGTACGTACGTACGTACGTACGTACGT";
        let anc = build_star3(seq_a, seq_a, seq_c);
        let date_table = DateTable::parse("a,2000.0\nc,2005.0\n");

        let mut engine = ClockTreeEngine::new(EngineConfig::default(), anc.tree().len());
        engine.nodes[2].bad_branch = true; // leaf "b"; left undated, so no demotion warning fires.
        engine.run(&anc, &date_table, None, 2010.0).unwrap();
        assert!(engine.node(NodeId(2)).msg_to_parent.is_none());
    }

    #[test]
    fn calibration_failure_aborts_before_message_passing() {
        let seq = b"ACGTACGTACGTACGTACGTACGTACGTACGT";
        let anc = build_star(seq, seq);
        let date_table = DateTable::parse("a,2000.0\nb,2000.0\n");

        let mut engine = ClockTreeEngine::new(EngineConfig::default(), anc.tree().len());
        let err = engine.run(&anc, &date_table, None, 2010.0).unwrap_err();
        assert!(matches!(err, ClockTreeError::Calibration(_)));
    }

    #[test]
    fn root_pinned_to_leaf_when_single_dated_leaf_and_fixed_slope() {
        let seq_a = b"ACGTACGTACGTACGTACGTACGTACGTACGT";
        let seq_b = b"ACGAACGTACGTACGTACGTACGTACGTACGT";
        let anc = build_star(seq_a, seq_b);
        let date_table = DateTable::parse("a,2000.0\nb,2001.0\n");

        let mut engine = ClockTreeEngine::new(EngineConfig::default(), anc.tree().len());
        engine
            .run(&anc, &date_table, Some(1.0e-3), 2010.0)
            .unwrap();

        let leaf_a = engine.node(NodeId(1));
        assert_relative_eq!(
            leaf_a.time_before_present.unwrap(),
            leaf_a.abs_t.unwrap(),
            epsilon = 1e-6
        );
    }
}
