//! # clocktree
//!
//! A molecular clock tree inference engine: given a rooted phylogeny
//! whose leaves carry sampling dates, per-edge sequence divergence and a
//! substitution model, this library infers a time-calibrated tree —
//! every node gets a probability distribution over its absolute time of
//! existence, a point date estimate (the joint maximum-likelihood
//! position), and branch lengths measured in time units.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! clocktree = "0.1"
//! ```
//!
//! ```rust
//! use clocktree::core::Real;
//!
//! let one_mutation: Real = 1.0 / 1300.0;
//! assert!(one_mutation > 0.0);
//! ```
//!
//! The hard core lives under [`engine`]: [`engine::ClockTreeEngine`]
//! drives the full postorder/preorder belief-propagation pass described
//! in the crate's design notes, built on the [`distribution::Distribution`]
//! algebra.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and the shared error hierarchy.
pub use ql_core as core;

/// Matrix/array newtypes and SVD-based least squares (used by
/// [`date_conversion`]'s OLS fit).
pub use ql_math as math;

pub use ql_clocktree::{
    branch_len_interpolator, clock_node, config, date_conversion, date_table, distribution,
    engine, errors, node_interpolator, substitution_model, tree, tree_anc,
};

pub use ql_clocktree::{
    BranchLenInterpolator, ClockNode, ClockTreeEngine, ClockTreeError, DateConversion, DateTable,
    Distribution, InMemoryTreeAnc, JukesCantor, NodeId, NodeInterpolator, NodeRecord, Result,
    SubstitutionModel, Tree, TreeAnc,
};

pub use ql_clocktree::{resolve_model, EngineConfig};
