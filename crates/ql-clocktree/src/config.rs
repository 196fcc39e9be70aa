//! Engine configuration constants (translates spec §6 "Configuration constants").
//!
//! The teacher replaces the Python original's module-level globals and
//! verbosity flag with an explicit struct threaded through the engine's
//! constructor (spec §9 Design Notes: "Global state ... Replace with an
//! explicit `Context { logger, config }`"). Logging itself goes through
//! `tracing`, so only the numeric knobs live here.

use ql_core::Real;

/// Stand-in for `+∞` in `y = -log p(x)` values; keeps arithmetic finite
/// and comparable without resorting to `f64::INFINITY` propagating NaNs
/// through interpolation and convolution.
pub const DEFAULT_BIG_NUMBER: Real = 1.0e10;

/// Default cap on `Distribution` grid sample count. Larger values trade
/// accuracy for speed; exceeded caps degrade gracefully via curvature-
/// preserving resampling (see [`crate::distribution::Distribution::from_grid`]).
pub const DEFAULT_MAX_GRID_POINTS: usize = 200;

/// Default target point density for convolution grids.
pub const DEFAULT_FFT_NODE_NUM: usize = 200;

/// Default log-likelihood threshold used to extend a branch-length
/// interpolator's support: `b_max` is the smallest `b` at which
/// `y(b) - y_min` first exceeds this value.
pub const DEFAULT_BRANCH_LEN_EXPLORATION: Real = 20.0;

/// Knobs governing distribution grid management, branch-length support
/// extension, and the "infinity" sentinel used throughout the engine.
///
/// Constructed once and passed to [`crate::engine::ClockTreeEngine::new`];
/// never read from global/static state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Cap on `Distribution` grid sample count.
    pub max_grid_points: usize,
    /// Target convolution grid point density.
    pub fft_node_num: usize,
    /// Log-likelihood threshold for branch-length support extension.
    pub branch_len_exploration: Real,
    /// Stand-in value for `+∞` in `y` values.
    pub big_number: Real,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_grid_points: DEFAULT_MAX_GRID_POINTS,
            fft_node_num: DEFAULT_FFT_NODE_NUM,
            branch_len_exploration: DEFAULT_BRANCH_LEN_EXPLORATION,
            big_number: DEFAULT_BIG_NUMBER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_positive() {
        let cfg = EngineConfig::default();
        assert!(cfg.max_grid_points > 0);
        assert!(cfg.fft_node_num > 0);
        assert!(cfg.branch_len_exploration > 0.0);
        assert!(cfg.big_number > 0.0);
    }
}
