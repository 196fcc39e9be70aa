//! `Distribution` — a piecewise-interpolated 1-D negative-log-density on a
//! bounded interval (translates spec §3 "Distribution" and §4.1 "C1").
//!
//! The representation is a tagged enum rather than a class hierarchy with
//! virtual dispatch (spec §9: "Dynamic dispatch → tagged variants"):
//! [`Distribution::Delta`] for Dirac masses (dated leaves), a regular
//! [`Distribution::Interp`] grid for everything else, and
//! [`Distribution::Dead`], the documented sentinel for an empty-support or
//! all-infinite result (spec §4.1: "zero-support intersections return a
//! documented sentinel ... rather than panicking").
//!
//! All operations are free functions or methods that return new values;
//! inputs are never mutated (spec §9: "Distributions as values, not objects
//! with hidden state").

use crate::config::EngineConfig;
use crate::errors::Result;
use ql_core::Real;

/// A non-negative, generally unnormalized, 1-D density `p(x) = exp(-y(x))`
/// represented by `y`, on a bounded support.
///
/// Corresponds to `Distribution`/`NodeInterpolator` in the original.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// A Dirac mass at `peak_pos` with the given integrated weight.
    Delta {
        /// The point of certainty.
        peak_pos: Real,
        /// `∫ p = weight`.
        weight: Real,
    },
    /// A piecewise-linear `-log` density on a bounded grid.
    Interp {
        /// Strictly increasing sample positions, `n >= 1`.
        xs: Vec<Real>,
        /// `y(x_i) = -log p(x_i)`, same length as `xs`.
        ys: Vec<Real>,
        /// `[xmin, xmax]`; `p ≡ 0` outside it.
        support: (Real, Real),
        /// Argmin of `y` (the mode of `p`).
        peak_pos: Real,
        /// Min of `y` (always `0.0`, see [`Distribution::from_grid`]).
        peak_val: Real,
        /// Accumulated log-density constant removed by normalization.
        offset: Real,
    },
    /// The impossible / zero distribution: empty support, `p ≡ 0`
    /// everywhere. Produced instead of panicking when an operation's
    /// inputs are mutually exclusive (spec §4.1, §8).
    Dead,
}

impl Distribution {
    /// Construct a Dirac mass at `x0` with the given weight (default `1.0`).
    ///
    /// Corresponds to `Distribution.delta_function`.
    pub fn delta(x0: Real, weight: Real) -> Distribution {
        Distribution::Delta {
            peak_pos: x0,
            weight,
        }
    }

    /// The documented "impossible" sentinel: empty support, evaluates to
    /// `+∞` (zero probability) everywhere.
    pub fn dead() -> Distribution {
        Distribution::Dead
    }

    /// `true` for the [`Distribution::Delta`] variant.
    pub fn is_delta(&self) -> bool {
        matches!(self, Distribution::Delta { .. })
    }

    /// `true` for the [`Distribution::Dead`] sentinel.
    pub fn is_dead(&self) -> bool {
        matches!(self, Distribution::Dead)
    }

    /// `[xmin, xmax]`. For [`Distribution::Dead`] this is the canonical
    /// empty interval `(+inf, -inf)` — any `xmin > xmax` check signals an
    /// empty support, which keeps "support monotonicity under
    /// multiplication" (spec §8) true vacuously.
    pub fn support(&self) -> (Real, Real) {
        match self {
            Distribution::Delta { peak_pos, .. } => (*peak_pos, *peak_pos),
            Distribution::Interp { support, .. } => *support,
            Distribution::Dead => (Real::INFINITY, Real::NEG_INFINITY),
        }
    }

    /// Argmin of `y` — the mode of `p`, and the point estimate used to
    /// extract joint-likelihood dates (spec §4.4.4).
    pub fn peak_pos(&self) -> Real {
        match self {
            Distribution::Delta { peak_pos, .. } => *peak_pos,
            Distribution::Interp { peak_pos, .. } => *peak_pos,
            Distribution::Dead => Real::NAN,
        }
    }

    /// Min of `y`.
    pub fn peak_val(&self) -> Real {
        match self {
            Distribution::Delta { weight, .. } => -weight.ln(),
            Distribution::Interp { peak_val, .. } => *peak_val,
            Distribution::Dead => Real::INFINITY,
        }
    }

    /// Accumulated log-density normalization constant (spec §4.1: "retain
    /// the subtracted offset if downstream needs absolute log-likelihoods").
    pub fn offset(&self) -> Real {
        match self {
            Distribution::Interp { offset, .. } => *offset,
            _ => 0.0,
        }
    }

    /// Full width at half maximum: the width of `{x : y(x) <= peak_val +
    /// ln 2}`. Used only to size convolution grids.
    pub fn fwhm(&self) -> Real {
        match self {
            Distribution::Delta { .. } | Distribution::Dead => 0.0,
            Distribution::Interp {
                xs,
                ys,
                peak_val,
                support,
                ..
            } => {
                let threshold = peak_val + std::f64::consts::LN_2;
                let mut left = support.0;
                let mut right = support.1;
                for w in xs.windows(2) {
                    let (x0, x1) = (w[0], w[1]);
                    let i = xs.iter().position(|&x| x == x0).unwrap();
                    let (y0, y1) = (ys[i], ys[i + 1]);
                    if y0 > threshold && y1 <= threshold {
                        let t = (threshold - y0) / (y1 - y0);
                        left = x0 + t * (x1 - x0);
                        break;
                    }
                }
                for w in xs.windows(2).rev() {
                    let (x0, x1) = (w[0], w[1]);
                    let i = xs.iter().position(|&x| x == x0).unwrap();
                    let (y0, y1) = (ys[i], ys[i + 1]);
                    if y1 > threshold && y0 <= threshold {
                        let t = (threshold - y0) / (y1 - y0);
                        right = x0 + t * (x1 - x0);
                        break;
                    }
                }
                (right - left).max(0.0)
            }
        }
    }

    fn locate(xs: &[Real], x: Real) -> usize {
        let n = xs.len();
        if x <= xs[0] {
            return 0;
        }
        if x >= xs[n - 1] {
            return n - 2;
        }
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if xs[mid] <= x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// `y(x) = -log p(x)`: `+∞` outside the support, the delta's own
    /// `-log weight` at its peak (and `+∞` everywhere else), linear
    /// interpolation on the grid otherwise.
    pub fn y(&self, x: Real) -> Real {
        match self {
            Distribution::Delta { peak_pos, weight } => {
                if x == *peak_pos {
                    -weight.ln()
                } else {
                    Real::INFINITY
                }
            }
            Distribution::Dead => Real::INFINITY,
            Distribution::Interp { xs, ys, support, .. } => {
                if x < support.0 || x > support.1 {
                    return Real::INFINITY;
                }
                if xs.len() == 1 {
                    return ys[0];
                }
                let i = Self::locate(xs, x);
                let (x0, x1) = (xs[i], xs[i + 1]);
                let dx = x1 - x0;
                if dx.abs() < Real::EPSILON {
                    return ys[i];
                }
                ys[i] + (x - x0) * (ys[i + 1] - ys[i]) / dx
            }
        }
    }

    /// `p(x) = exp(-y(x))`.
    pub fn prob(&self, x: Real) -> Real {
        (-self.y(x)).exp()
    }

    /// `exp(peak_val - y(x))` — the density normalized so the mode is `1`.
    /// Display-only; `Distribution` is not maintained normalized to
    /// integrate to `1` (spec §3).
    pub fn prob_relative(&self, x: Real) -> Real {
        (self.peak_val() - self.y(x)).exp()
    }

    /// `x' = x + delta`; translates support, grid, and `peak_pos`.
    ///
    /// Corresponds to `Distribution.shifted_x`.
    pub fn shifted_x(&self, delta: Real) -> Distribution {
        match self {
            Distribution::Delta { peak_pos, weight } => Distribution::Delta {
                peak_pos: peak_pos + delta,
                weight: *weight,
            },
            Distribution::Dead => Distribution::Dead,
            Distribution::Interp {
                xs,
                ys,
                support,
                peak_pos,
                peak_val,
                offset,
            } => Distribution::Interp {
                xs: xs.iter().map(|x| x + delta).collect(),
                ys: ys.clone(),
                support: (support.0 + delta, support.1 + delta),
                peak_pos: peak_pos + delta,
                peak_val: *peak_val,
                offset: *offset,
            },
        }
    }

    /// `x' = alpha * x`; reverses the grid to stay monotonic when `alpha <
    /// 0`.
    ///
    /// Corresponds to `Distribution.x_rescale`.
    pub fn x_rescale(&self, alpha: Real) -> Distribution {
        match self {
            Distribution::Delta { peak_pos, weight } => Distribution::Delta {
                peak_pos: peak_pos * alpha,
                weight: *weight,
            },
            Distribution::Dead => Distribution::Dead,
            Distribution::Interp {
                xs,
                ys,
                support,
                peak_pos,
                peak_val,
                offset,
            } => {
                let mut new_xs: Vec<Real> = xs.iter().map(|x| x * alpha).collect();
                let mut new_ys = ys.clone();
                if alpha < 0.0 {
                    new_xs.reverse();
                    new_ys.reverse();
                }
                let (a, b) = (support.0 * alpha, support.1 * alpha);
                let new_support = (a.min(b), a.max(b));
                Distribution::Interp {
                    xs: new_xs,
                    ys: new_ys,
                    support: new_support,
                    peak_pos: peak_pos * alpha,
                    peak_val: *peak_val,
                    offset: *offset,
                }
            }
        }
    }

    /// Multiply by a uniform constant factor `exp(-c)` in `-log` space
    /// (i.e. add `c` to every `y`). Used internally to fold a delta's
    /// weight into a convolution result.
    fn add_const(&self, c: Real) -> Distribution {
        if c == 0.0 {
            return self.clone();
        }
        match self {
            Distribution::Delta { peak_pos, weight } => Distribution::Delta {
                peak_pos: *peak_pos,
                weight: weight * (-c).exp(),
            },
            Distribution::Dead => Distribution::Dead,
            Distribution::Interp {
                xs,
                ys,
                support,
                peak_pos,
                peak_val,
                offset,
            } => Distribution::Interp {
                xs: xs.clone(),
                ys: ys.iter().map(|y| y + c).collect(),
                support: *support,
                peak_pos: *peak_pos,
                peak_val: peak_val + c,
                offset: *offset,
            },
        }
    }

    /// Build a normalized [`Distribution::Interp`] from a raw `(xs, ys)`
    /// grid: deduplicates/sorts is the caller's responsibility (all
    /// internal callers already produce strictly increasing `xs`),
    /// resamples down to `cfg.max_grid_points` preserving local curvature
    /// if needed, and renormalizes so `peak_val == 0.0`, folding the
    /// subtracted amount into `offset`.
    pub(crate) fn from_grid(
        mut xs: Vec<Real>,
        mut ys: Vec<Real>,
        carried_offset: Real,
        cfg: &EngineConfig,
    ) -> Result<Distribution> {
        if xs.is_empty() {
            return Ok(Distribution::Dead);
        }
        if xs.len() > cfg.max_grid_points {
            let (rxs, rys) = resample_preserving_curvature(&xs, &ys, cfg.max_grid_points);
            xs = rxs;
            ys = rys;
        }
        let (mut min_y, mut min_i) = (ys[0], 0usize);
        for (i, &y) in ys.iter().enumerate() {
            if y < min_y {
                min_y = y;
                min_i = i;
            }
        }
        if !min_y.is_finite() {
            return Ok(Distribution::Dead);
        }
        let peak_pos = xs[min_i];
        for y in ys.iter_mut() {
            *y -= min_y;
            if *y > cfg.big_number {
                *y = cfg.big_number;
            }
        }
        let support = (xs[0], *xs.last().unwrap());
        Ok(Distribution::Interp {
            xs,
            ys,
            support,
            peak_pos,
            peak_val: 0.0,
            offset: carried_offset + min_y,
        })
    }
}

/// Subsample `(xs, ys)` down to at most `max_points` samples, always
/// keeping the endpoints and preferring interior points with the largest
/// discrete second difference (spec §4.1: "preserving local curvature ...
/// keep points where the second difference is largest").
fn resample_preserving_curvature(
    xs: &[Real],
    ys: &[Real],
    max_points: usize,
) -> (Vec<Real>, Vec<Real>) {
    let n = xs.len();
    if n <= max_points || n < 3 {
        return (xs.to_vec(), ys.to_vec());
    }
    let mut scored: Vec<(usize, Real)> = (1..n - 1)
        .map(|i| (i, (ys[i - 1] - 2.0 * ys[i] + ys[i + 1]).abs()))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let keep_count = max_points.saturating_sub(2);
    let mut keep: Vec<usize> = scored.into_iter().take(keep_count).map(|(i, _)| i).collect();
    keep.push(0);
    keep.push(n - 1);
    keep.sort_unstable();
    keep.dedup();
    (
        keep.iter().map(|&i| xs[i]).collect(),
        keep.iter().map(|&i| ys[i]).collect(),
    )
}

/// Pointwise product of densities: sum of `y` on the intersection of
/// supports (spec §4.1 "Multiply").
///
/// - If any input is delta, the result is delta at the (common) delta
///   position with weight `Π exp(-y_j(x0))`; multiple deltas at distinct
///   positions yield [`Distribution::Dead`].
/// - Otherwise the result grid is the union of input grids restricted to
///   the support intersection, capped and curvature-subsampled per
///   `cfg.max_grid_points`.
pub fn multiply(items: &[&Distribution], cfg: &EngineConfig) -> Result<Distribution> {
    if items.is_empty() {
        return Ok(Distribution::Dead);
    }
    if items.iter().any(|d| d.is_dead()) {
        return Ok(Distribution::Dead);
    }
    if items.len() == 1 {
        return Ok(items[0].clone());
    }

    if items.iter().any(|d| d.is_delta()) {
        let x0 = items.iter().find(|d| d.is_delta()).unwrap().peak_pos();
        for d in items {
            if d.is_delta() && d.peak_pos() != x0 {
                return Ok(Distribution::Dead);
            }
        }
        let mut total_y = 0.0;
        for d in items {
            let yx = d.y(x0);
            if !yx.is_finite() {
                return Ok(Distribution::Dead);
            }
            total_y += yx;
        }
        return Ok(Distribution::delta(x0, (-total_y).exp()));
    }

    let mut xmin = Real::NEG_INFINITY;
    let mut xmax = Real::INFINITY;
    for d in items {
        let (a, b) = d.support();
        xmin = xmin.max(a);
        xmax = xmax.min(b);
    }
    if xmin > xmax {
        return Ok(Distribution::Dead);
    }

    let mut grid_xs: Vec<Real> = Vec::new();
    for d in items {
        if let Distribution::Interp { xs, .. } = d {
            grid_xs.extend(xs.iter().copied().filter(|&x| x >= xmin && x <= xmax));
        }
    }
    grid_xs.push(xmin);
    grid_xs.push(xmax);
    grid_xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    grid_xs.dedup_by(|a, b| ql_math::comparison::close(*a, *b, 1e-12));

    let ys: Vec<Real> = grid_xs
        .iter()
        .map(|&x| items.iter().map(|d| d.y(x)).sum::<Real>())
        .collect();

    let carried_offset: Real = items.iter().map(|d| d.offset()).sum();
    Distribution::from_grid(grid_xs, ys, carried_offset, cfg)
}

/// `C(z) = ∫ A(t) B(z - t) dt`, or `∫ A(t) B(t - z) dt` when `inverse_time`
/// (spec §4.1 "Convolve"). Delegates to [`Distribution::shifted_x`] in
/// O(|B|) (resp. O(|A|)) whenever either operand is a delta; otherwise
/// performs a brute-force log-domain summation (log-sum-exp) over a grid
/// sized from `cfg.fft_node_num`.
pub fn convolve(
    a: &Distribution,
    b: &Distribution,
    inverse_time: bool,
    cfg: &EngineConfig,
) -> Result<Distribution> {
    if a.is_dead() || b.is_dead() {
        return Ok(Distribution::Dead);
    }
    if let Distribution::Delta { peak_pos: t0, weight } = a {
        let base = if inverse_time { b.x_rescale(-1.0) } else { b.clone() };
        return Ok(base.shifted_x(*t0).add_const(-weight.ln()));
    }
    if let Distribution::Delta { peak_pos: t0, weight } = b {
        let shift = if inverse_time { -t0 } else { *t0 };
        return Ok(a.shifted_x(shift).add_const(-weight.ln()));
    }

    let (amin, amax) = a.support();
    let (bmin, bmax) = b.support();
    let (zmin, zmax) = if inverse_time {
        (amin - bmax, amax - bmin)
    } else {
        (amin + bmin, amax + bmax)
    };
    if zmin > zmax {
        return Ok(Distribution::Dead);
    }

    let n_z = cfg.fft_node_num.clamp(2, cfg.max_grid_points.max(2));
    let n_t = cfg.fft_node_num.clamp(8, 64);
    let mut zs = Vec::with_capacity(n_z);
    let mut ys = Vec::with_capacity(n_z);
    for i in 0..n_z {
        let z = if n_z == 1 {
            zmin
        } else {
            zmin + (zmax - zmin) * (i as Real) / ((n_z - 1) as Real)
        };
        let (tlo, thi) = if inverse_time {
            (amin.max(z + bmin), amax.min(z + bmax))
        } else {
            (amin.max(z - bmax), amax.min(z - bmin))
        };
        if tlo > thi {
            zs.push(z);
            ys.push(cfg.big_number);
            continue;
        }
        let mut vals = Vec::with_capacity(n_t);
        for k in 0..n_t {
            let t = if (thi - tlo).abs() < Real::EPSILON || n_t == 1 {
                tlo
            } else {
                tlo + (thi - tlo) * (k as Real) / ((n_t - 1) as Real)
            };
            let b_arg = if inverse_time { t - z } else { z - t };
            vals.push(a.y(t) + b.y(b_arg));
        }
        let m = vals.iter().cloned().fold(Real::INFINITY, Real::min);
        let y_z = if !m.is_finite() {
            cfg.big_number
        } else if (thi - tlo).abs() < Real::EPSILON {
            vals[0]
        } else {
            let dt = (thi - tlo) / (n_t - 1) as Real;
            let mut s = 0.0;
            for (k, &v) in vals.iter().enumerate() {
                let w = if k == 0 || k == n_t - 1 { 0.5 } else { 1.0 } * dt;
                s += (-(v - m)).exp() * w;
            }
            if s <= 0.0 {
                cfg.big_number
            } else {
                m - s.ln()
            }
        };
        zs.push(z);
        ys.push(y_z.min(cfg.big_number));
    }

    let carried_offset = a.offset() + b.offset();
    Distribution::from_grid(zs, ys, carried_offset, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gaussian(mu: Real, sigma: Real, n: usize, half_width: Real) -> Distribution {
        let cfg = EngineConfig::default();
        let xs: Vec<Real> = (0..n)
            .map(|i| mu - half_width + 2.0 * half_width * (i as Real) / ((n - 1) as Real))
            .collect();
        let ys: Vec<Real> = xs.iter().map(|&x| 0.5 * ((x - mu) / sigma).powi(2)).collect();
        Distribution::from_grid(xs, ys, 0.0, &cfg).unwrap()
    }

    #[test]
    fn delta_absorption_in_support() {
        let cfg = EngineConfig::default();
        let d = gaussian(1.0, 0.5, 50, 3.0);
        let delta = Distribution::delta(1.0, 1.0);
        let res = multiply(&[&delta, &d], &cfg).unwrap();
        assert!(res.is_delta());
        assert_abs_diff_eq!(res.peak_pos(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d.y(1.0).exp().recip().ln(), -d.y(1.0), epsilon = 1e-9);
    }

    #[test]
    fn delta_absorption_outside_support() {
        let cfg = EngineConfig::default();
        let d = gaussian(1.0, 0.5, 50, 0.1);
        let delta = Distribution::delta(10.0, 1.0);
        let res = multiply(&[&delta, &d], &cfg).unwrap();
        assert!(res.is_dead());
    }

    #[test]
    fn multiple_distinct_deltas_are_dead() {
        let cfg = EngineConfig::default();
        let d1 = Distribution::delta(1.0, 1.0);
        let d2 = Distribution::delta(2.0, 1.0);
        let res = multiply(&[&d1, &d2], &cfg).unwrap();
        assert!(res.is_dead());
    }

    #[test]
    fn support_monotonicity_under_multiply() {
        let cfg = EngineConfig::default();
        let a = gaussian(0.0, 1.0, 40, 4.0);
        let b = gaussian(1.0, 1.0, 40, 4.0);
        let res = multiply(&[&a, &b], &cfg).unwrap();
        let (rmin, rmax) = res.support();
        let (amin, amax) = a.support();
        let (bmin, bmax) = b.support();
        assert!(rmin >= amin.max(bmin) - 1e-9);
        assert!(rmax <= amax.min(bmax) + 1e-9);
    }

    #[test]
    fn convolve_with_delta_matches_shift() {
        let cfg = EngineConfig::default();
        let g = gaussian(0.0, 1.0, 60, 5.0);
        let delta = Distribution::delta(2.0, 1.0);
        let res = convolve(&delta, &g, false, &cfg).unwrap();
        for x in [-1.0, 0.0, 1.0, 2.0] {
            assert_abs_diff_eq!(res.y(x + 2.0), g.y(x), epsilon = 1e-6);
        }
    }

    #[test]
    fn convolve_identity_other_order() {
        let cfg = EngineConfig::default();
        let g = gaussian(0.0, 1.0, 60, 5.0);
        let delta = Distribution::delta(0.0, 1.0);
        let res = convolve(&g, &delta, false, &cfg).unwrap();
        assert_abs_diff_eq!(res.peak_pos(), g.peak_pos(), epsilon = 1e-6);
        for x in [-2.0, -1.0, 0.0, 1.0, 2.0] {
            assert_abs_diff_eq!(res.y(x), g.y(x), epsilon = 1e-6);
        }
    }

    #[test]
    fn shift_and_rescale() {
        let g = gaussian(0.0, 1.0, 10, 3.0);
        let shifted = g.shifted_x(5.0);
        assert_abs_diff_eq!(shifted.peak_pos(), 5.0, epsilon = 1e-12);
        let rescaled = g.x_rescale(-1.0);
        assert_abs_diff_eq!(rescaled.peak_pos(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rescaled.y(1.0), g.y(-1.0), epsilon = 1e-9);
    }

    #[test]
    fn dead_distribution_is_zero_everywhere() {
        let d = Distribution::dead();
        assert!(d.is_dead());
        assert_eq!(d.prob(0.0), 0.0);
        let (lo, hi) = d.support();
        assert!(lo > hi);
    }
}
