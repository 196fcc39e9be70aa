//! `DateConversion` (spec §3/§4.3, "C4") — the affine calibration between
//! sampling date and branch length, fitted by ordinary least squares over
//! dated terminals.
//!
//! Built on the teacher's `ql-math` least-squares engine
//! (`ql_math::linear_least_squares::LinearLeastSquaresRegression`), the
//! same machine the teacher itself reuses for Longstaff-Schwartz-style
//! regression — here specialized to a single predictor (date) rather than
//! a basis-function expansion.

use crate::errors::{ensure_calibration, ClockTreeError, Result};
use chrono::NaiveDate;
use ql_core::Real;
use ql_math::linear_least_squares::LinearLeastSquaresRegression;

/// `b = slope * date + intercept`, fit over `(numdate, root_to_tip_branch_length)`
/// pairs for every dated, non-`bad_branch` leaf.
#[derive(Debug, Clone, Copy)]
pub struct DateConversion {
    /// Regression slope (branch-length units per year).
    pub slope: Real,
    /// Regression intercept (branch-length units).
    pub intercept: Real,
    /// Correlation coefficient of the fit (signed, unlike `r_val.powi(2)`).
    pub r_val: Real,
}

impl DateConversion {
    /// Fit the calibration from parallel `dates`/`branch_lengths` arrays
    /// (one entry per dated, non-bad-branch leaf).
    ///
    /// `slope_hint`, if given, fixes the slope and fits only the
    /// intercept — spec §4.3's "If `slope_hint` given, fix slope and fit
    /// only intercept".
    ///
    /// # Errors
    /// Returns [`ClockTreeError::Calibration`] if fewer than two dated
    /// leaves are supplied, or if the fitted (or hinted) slope has the
    /// wrong sign: later dates must increase root-to-tip distance.
    pub fn from_observations(
        dates: &[Real],
        branch_lengths: &[Real],
        slope_hint: Option<Real>,
    ) -> Result<Self> {
        ensure_calibration!(
            dates.len() == branch_lengths.len(),
            "dates and branch_lengths must have the same length"
        );
        ensure_calibration!(
            dates.len() >= 2,
            "calibration requires at least two dated leaves, got {}",
            dates.len()
        );
        ensure_calibration!(
            !dates
                .iter()
                .all(|&d| ql_math::comparison::close(d, dates[0], 1e-12)),
            "all dated leaves share a single sampling date; slope is undetermined"
        );

        let (slope, intercept, r_val) = match slope_hint {
            Some(slope) => {
                let n = dates.len() as Real;
                let mean_b: Real = branch_lengths.iter().sum::<Real>() / n;
                let mean_d: Real = dates.iter().sum::<Real>() / n;
                let intercept = mean_b - slope * mean_d;
                let r_val = pearson_r(dates, branch_lengths);
                (slope, intercept, r_val)
            }
            None => {
                let basis: Vec<Box<dyn Fn(Real) -> Real>> =
                    vec![Box::new(|_| 1.0), Box::new(|d| d)];
                let reg = LinearLeastSquaresRegression::new(dates, branch_lengths, &basis)
                    .map_err(|e| ClockTreeError::Calibration(e.to_string()))?;
                let coeffs = reg.coefficients();
                let intercept = coeffs[0];
                let slope = coeffs[1];
                let r_val = pearson_r(dates, branch_lengths);
                (slope, intercept, r_val)
            }
        };

        if slope <= 0.0 {
            return Err(ClockTreeError::Calibration(format!(
                "regression slope has the wrong sign ({slope}); later dates must increase \
                 root-to-tip distance"
            )));
        }

        Ok(Self {
            slope,
            intercept,
            r_val,
        })
    }

    /// `years_bp = (intercept - t) / |slope|` (spec §4.3).
    pub fn get_date(&self, time_before_present: Real) -> Real {
        (self.intercept - time_before_present) / self.slope.abs()
    }
}

fn pearson_r(xs: &[Real], ys: &[Real]) -> Real {
    let n = xs.len() as Real;
    let mean_x: Real = xs.iter().sum::<Real>() / n;
    let mean_y: Real = ys.iter().sum::<Real>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        1.0
    } else {
        cov / (var_x.sqrt() * var_y.sqrt())
    }
}

/// Render a fractional decimal year as a calendar date string (spec
/// §4.4.5), using a proleptic Gregorian calendar via `chrono`.
///
/// Falls back to an approximate `"YYYY-M-D"` string built from a
/// 365.25-day year when `numdate` falls outside `chrono::NaiveDate`'s
/// representable range — the "documented degradation" spec.md calls for,
/// rather than panicking or silently clamping.
pub fn render_date_string(numdate: Real) -> String {
    let year = numdate.floor();
    let frac = numdate - year;
    let day_of_year = (frac * 365.25).round() as i64;

    if let Some(date) = NaiveDate::from_yo_opt(year as i32, 1)
        .and_then(|jan1| jan1.checked_add_signed(chrono::Duration::days(day_of_year)))
    {
        return date.format("%Y-%m-%d").to_string();
    }

    let month = (day_of_year / 30).clamp(0, 11) + 1;
    let day = (day_of_year % 30) + 1;
    format!("{}-{}-{}", year as i64, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_known_linear_relationship() {
        let dates: Vec<Real> = vec![2000.0, 2001.0, 2002.0, 2003.0, 2005.0];
        let branch_lengths: Vec<Real> = dates.iter().map(|&d| 0.001 * d - 1.9).collect();
        let dc = DateConversion::from_observations(&dates, &branch_lengths, None).unwrap();
        assert_relative_eq!(dc.slope, 0.001, epsilon = 1e-9);
        assert_relative_eq!(dc.r_val, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn round_trips_through_get_date() {
        let dates: Vec<Real> = vec![2000.0, 2002.0, 2004.0, 2006.0];
        let branch_lengths: Vec<Real> = dates.iter().map(|&d| 0.0005 * d).collect();
        let dc = DateConversion::from_observations(&dates, &branch_lengths, None).unwrap();
        let t = 0.0005 * 2003.0;
        assert_relative_eq!(dc.get_date(t), 2003.0, epsilon = 1e-6);
    }

    #[test]
    fn fewer_than_two_dated_leaves_fails() {
        assert!(DateConversion::from_observations(&[2000.0], &[0.1], None).is_err());
    }

    #[test]
    fn identical_dates_fail_calibration() {
        let dates = vec![2000.0, 2000.0, 2000.0];
        let branch_lengths = vec![0.1, 0.2, 0.15];
        assert!(DateConversion::from_observations(&dates, &branch_lengths, None).is_err());
    }

    #[test]
    fn wrong_sign_slope_fails() {
        let dates: Vec<Real> = vec![2000.0, 2001.0, 2002.0];
        let branch_lengths: Vec<Real> = dates.iter().map(|&d| -0.001 * d + 3.0).collect();
        assert!(DateConversion::from_observations(&dates, &branch_lengths, None).is_err());
    }

    #[test]
    fn slope_hint_fixes_slope_and_fits_intercept_only() {
        let dates: Vec<Real> = vec![2000.0, 2001.0, 2002.0, 2003.0];
        let branch_lengths: Vec<Real> = dates.iter().map(|&d| 0.001 * d + 0.5).collect();
        let dc = DateConversion::from_observations(&dates, &branch_lengths, Some(0.001)).unwrap();
        assert_relative_eq!(dc.slope, 0.001, epsilon = 1e-12);
        assert_relative_eq!(dc.intercept, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn renders_ordinary_dates() {
        let s = render_date_string(2000.5);
        assert!(s.starts_with("2000-"));
    }

    #[test]
    fn degrades_gracefully_far_outside_range() {
        let s = render_date_string(-900_000.0);
        assert!(s.contains("900000") || s.starts_with("-900000"));
    }
}
