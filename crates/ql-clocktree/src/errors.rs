//! Error types for the clock tree engine (translates spec §7).
//!
//! Mirrors `ql-core`'s flat, `thiserror`-derived hierarchy: one enum, one
//! `ensure!`-style macro for the precondition checks that recur throughout
//! the distribution algebra and message passing.

use crate::tree::NodeId;
use thiserror::Error;

/// The error type returned by fallible operations in this crate.
///
/// `ConsistencyWarning` (spec §7 kind 4) has no variant here: consistency
/// issues are logged via `tracing::warn!` and the run continues, per the
/// spec's recovery policy (see [`crate::engine::ClockTreeEngine`]).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockTreeError {
    /// Missing date table, tree without a root, or an unknown substitution
    /// model identifier.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Fewer than two dated leaves, or a regression slope with the wrong
    /// sign (later dates should increase root-to-tip distance).
    #[error("calibration error: {0}")]
    Calibration(String),

    /// A distribution operation (multiply/convolve) produced an
    /// empty-support or all-infinite result.
    #[error("numeric error at node {node:?}: {detail}")]
    Numeric {
        /// The node whose message-passing step failed.
        node: NodeId,
        /// Human-readable description of the failure.
        detail: String,
    },

    /// A node's inferred date fell outside the calendar's representable
    /// range; the caller receives an approximate `"YYYY-M-D"` string
    /// instead (see [`crate::date_conversion::render_date_string`]).
    #[error("calendar error: {0}")]
    Calendar(String),
}

/// Shorthand `Result` type used throughout this crate.
pub type Result<T, E = ClockTreeError> = std::result::Result<T, E>;

/// Equivalent to `ql_core::ensure!`, specialized to [`ClockTreeError::Configuration`].
macro_rules! ensure_config {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::ClockTreeError::Configuration(format!($($msg)*)));
        }
    };
}
pub(crate) use ensure_config;

/// Equivalent to `ql_core::ensure!`, specialized to [`ClockTreeError::Calibration`].
macro_rules! ensure_calibration {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::ClockTreeError::Calibration(format!($($msg)*)));
        }
    };
}
pub(crate) use ensure_calibration;
