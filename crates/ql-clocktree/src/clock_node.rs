//! Per-node clock state (spec §3 "ClockNode"), stored as a parallel array
//! indexed by [`crate::tree::NodeId`] alongside the topology in
//! [`crate::tree::Tree`] — the arena pattern spelled out in `SPEC_FULL.md`
//! §5.

use crate::distribution::Distribution;
use crate::tree::NodeId;
use std::collections::BTreeMap;

/// The clock-specific state attached to one tree node throughout
/// initialization, message passing and finalization.
///
/// All fields start empty (`Default`) and are filled in by
/// [`crate::engine::ClockTreeEngine`]'s phases in the order spec.md §4.4
/// describes them; nothing here is computed eagerly at construction.
#[derive(Debug, Clone, Default)]
pub struct ClockNode {
    /// Sampling date, if this is a dated leaf.
    pub numdate_given: Option<f64>,
    /// Excluded from clock constraints (spec §4.4.1 step 6, §7 kind 4).
    pub bad_branch: bool,
    /// Absolute time before present, in branch-length units; seeded for
    /// dated leaves during initialization.
    pub abs_t: Option<f64>,
    /// Density over this edge's branch length (C2 output); `None` at the
    /// root, which has no parent edge.
    pub branch_length_interpolator: Option<Distribution>,
    /// Message this node sends to its parent (upward pass).
    pub msg_to_parent: Option<Distribution>,
    /// Incoming per-child messages, retained so the downward pass can
    /// recombine all but one child's contribution.
    pub msgs_from_leaves: BTreeMap<NodeId, Distribution>,
    /// Message this node receives from its parent (downward pass).
    pub msg_from_parent: Option<Distribution>,
    /// Final marginal posterior (product of both passes' messages).
    pub marginal_lh: Option<Distribution>,
    /// Final joint (most-likely-path) posterior.
    pub joint_lh: Option<Distribution>,
    /// Inferred time before present, in branch-length units.
    pub time_before_present: Option<f64>,
    /// Inferred branch length in time units (parent minus child time).
    pub branch_length: Option<f64>,
    /// Branch length in substitution units (copied from C2's input).
    pub clock_length: Option<f64>,
    /// Inferred sampling date, in decimal years.
    pub numdate: Option<f64>,
    /// Rendered calendar date (`"YYYY-MM-DD"`, or the degraded
    /// `"YYYY-M-D"` form outside `chrono`'s representable range).
    pub date_string: Option<String>,
}

impl ClockNode {
    /// A node with no state set — the starting point for every node
    /// before initialization (spec §4.4.1).
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_has_no_messages() {
        let n = ClockNode::new();
        assert!(n.msg_to_parent.is_none());
        assert!(n.msg_from_parent.is_none());
        assert!(n.msgs_from_leaves.is_empty());
        assert!(!n.bad_branch);
    }
}
