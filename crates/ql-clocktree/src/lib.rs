//! Molecular clock tree inference.
//!
//! Given a rooted phylogeny with per-leaf sampling dates, per-edge
//! sequence divergence and a substitution model, this crate infers a
//! time-calibrated tree: every node gets a probability distribution over
//! its absolute time, a point date estimate, and branch lengths in time
//! units. The algorithm is belief propagation over one-dimensional
//! continuous distributions, run as a postorder pass from the leaves to
//! the root followed by a preorder pass back down.
//!
//! The six load-bearing pieces:
//! - [`distribution`] — [`Distribution`], the piecewise log-density type
//!   at the center of everything (multiply, convolve, shift, rescale).
//! - [`branch_len_interpolator`] — per-edge density over branch length.
//! - [`node_interpolator`] — the two message-passing primitives,
//!   specialized constructors over [`Distribution`].
//! - [`date_conversion`] — the date/branch-length affine calibration.
//! - [`engine`] — [`engine::ClockTreeEngine`], the orchestrator.
//! - [`tree_anc`] — the read-only topology/sequence/model adapter.

pub mod branch_len_interpolator;
pub mod clock_node;
pub mod config;
pub mod date_conversion;
pub mod date_table;
pub mod distribution;
pub mod engine;
pub mod errors;
pub mod node_interpolator;
pub mod substitution_model;
pub mod tree;
pub mod tree_anc;

pub use branch_len_interpolator::BranchLenInterpolator;
pub use clock_node::ClockNode;
pub use config::EngineConfig;
pub use date_conversion::DateConversion;
pub use date_table::DateTable;
pub use distribution::Distribution;
pub use engine::ClockTreeEngine;
pub use errors::{ClockTreeError, Result};
pub use node_interpolator::NodeInterpolator;
pub use substitution_model::{resolve_model, JukesCantor, SubstitutionModel};
pub use tree::{NodeId, NodeRecord, Tree};
pub use tree_anc::{InMemoryTreeAnc, TreeAnc};
