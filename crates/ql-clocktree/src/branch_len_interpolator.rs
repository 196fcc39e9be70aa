//! `BranchLenInterpolator` (spec §3/§4.2, "C2") — per-edge density over
//! branch length in substitution units, derived from the substitution
//! model's log-likelihood.

use crate::config::EngineConfig;
use crate::distribution::Distribution;
use crate::errors::Result;
use crate::substitution_model::SubstitutionModel;
use ql_core::Real;

/// A density over non-negative branch length `b`, proportional to
/// `P(child_seq | parent_seq, b)` under the substitution model.
///
/// Corresponds to `BranchLenInterpolator`.
#[derive(Debug, Clone)]
pub struct BranchLenInterpolator {
    dist: Distribution,
}

/// Hard cap on branch-length search, in expected substitutions per site.
/// Far beyond any biologically plausible single-edge divergence; exists
/// only to terminate the `b_max` search on pathological inputs.
const SEARCH_CAP: Real = 100.0;

impl BranchLenInterpolator {
    /// Build the per-edge branch-length density.
    ///
    /// `one_mutation` seeds the initial search step (`1 / alignment_length`,
    /// spec §4.5); `b_max` is extended by doubling until the
    /// log-likelihood exceeds its minimum by `cfg.branch_len_exploration`
    /// (spec §4.2), then the density is sampled on a grid from `0` to
    /// `b_max`.
    pub fn new(
        child_seq: &[u8],
        parent_seq: &[u8],
        model: &dyn SubstitutionModel,
        one_mutation: Real,
        cfg: &EngineConfig,
    ) -> Result<Self> {
        let step = one_mutation.max(1e-9);
        let y_at = |b: Real| -model.log_prob_t(child_seq, parent_seq, b);

        let mut y_min = y_at(0.0);
        let mut b = step;
        let mut b_max = 0.0;
        loop {
            let yb = y_at(b);
            if yb < y_min {
                y_min = yb;
            }
            if yb - y_min > cfg.branch_len_exploration || b >= SEARCH_CAP {
                b_max = b;
                break;
            }
            b *= 2.0;
        }
        let b_max = b_max.max(step);

        let n = cfg.max_grid_points.clamp(10, 200);
        let xs: Vec<Real> = (0..n)
            .map(|i| b_max * (i as Real) / ((n - 1) as Real))
            .collect();
        let ys: Vec<Real> = xs.iter().map(|&bb| y_at(bb)).collect();

        let dist = Distribution::from_grid(xs, ys, 0.0, cfg)?;
        Ok(Self { dist })
    }

    /// The underlying density over branch length.
    pub fn distribution(&self) -> &Distribution {
        &self.dist
    }

    /// Consume `self`, returning the underlying density.
    pub fn into_distribution(self) -> Distribution {
        self.dist
    }

    /// Maximum-likelihood branch length (the density's mode).
    pub fn peak(&self) -> Real {
        self.dist.peak_pos()
    }
}
