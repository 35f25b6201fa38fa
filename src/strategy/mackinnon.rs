//! MacKinnon Response Surfaces
//!
//! Approximate asymptotic p-values for Dickey-Fuller style t-statistics
//! (MacKinnon 1994) and finite-sample critical values (MacKinnon 2010), for
//! regressions with a constant term. `n_vars` is the number of integrated
//! variables: 1 for a plain ADF test, 2 for a two-series Engle-Granger test.
//!
//! p = Phi(poly(tau)), with a quadratic polynomial left of `tau_star` and a
//! cubic to the right.

use statrs::distribution::{ContinuousCDF, Normal};

/// Supported numbers of integrated variables
pub const MAX_VARIABLES: usize = 2;

const TAU_MAX: [f64; MAX_VARIABLES] = [2.74, 0.92];
const TAU_MIN: [f64; MAX_VARIABLES] = [-18.83, -18.86];
const TAU_STAR: [f64; MAX_VARIABLES] = [-1.61, -2.62];

const SMALL_P: [[f64; 3]; MAX_VARIABLES] = [
    [2.1659, 1.4412, 0.038269],
    [2.92, 1.5012, 0.039796],
];

const LARGE_P: [[f64; 4]; MAX_VARIABLES] = [
    [1.7339, 0.93202, -0.12745, -0.010368],
    [2.1945, 0.64695, -0.29198, -0.042377],
];

/// Critical value coefficients b0 + b1/T + b2/T^2 + b3/T^3, rows 1%, 5%, 10%
const CRITICAL: [[[f64; 4]; 3]; MAX_VARIABLES] = [
    [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
    [
        [-3.89644, -10.9519, -22.527, 0.0],
        [-3.33613, -6.1101, -6.823, 0.0],
        [-3.04445, -4.2412, -2.720, 0.0],
    ],
];

/// 1%, 5% and 10% critical values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Asymptotic p-value of a unit-root t-statistic.
///
/// Statistics below the surface's lower limit are evaluated at the limit, so
/// the result stays strictly positive. Returns `None` for an unsupported
/// `n_vars` or a NaN statistic.
pub fn p_value(tau: f64, n_vars: usize) -> Option<f64> {
    if tau.is_nan() || n_vars == 0 || n_vars > MAX_VARIABLES {
        return None;
    }
    let i = n_vars - 1;

    if tau > TAU_MAX[i] {
        return Some(1.0);
    }
    let tau = tau.max(TAU_MIN[i]);

    let z = if tau <= TAU_STAR[i] {
        polyval(&SMALL_P[i], tau)
    } else {
        polyval(&LARGE_P[i], tau)
    };

    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(normal.cdf(z))
}

/// Finite-sample critical values for `nobs` observations
pub fn critical_values(n_vars: usize, nobs: usize) -> Option<CriticalValues> {
    if n_vars == 0 || n_vars > MAX_VARIABLES || nobs == 0 {
        return None;
    }
    let table = &CRITICAL[n_vars - 1];
    let inv = 1.0 / nobs as f64;
    let value = |c: &[f64; 4]| polyval(c, inv);

    Some(CriticalValues {
        one_pct: value(&table[0]),
        five_pct: value(&table[1]),
        ten_pct: value(&table[2]),
    })
}

/// c0 + c1*x + c2*x^2 + ...
fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_five_percent_points() {
        // Classic 5% critical values map back to p ~ 0.05
        assert_relative_eq!(p_value(-2.86, 1).unwrap(), 0.050, epsilon = 0.002);
        assert_relative_eq!(p_value(-3.34, 2).unwrap(), 0.050, epsilon = 0.002);
    }

    #[test]
    fn test_surface_is_continuous_at_tau_star() {
        for n in 1..=MAX_VARIABLES {
            let star = TAU_STAR[n - 1];
            let left = p_value(star, n).unwrap();
            let right = p_value(star + 1e-9, n).unwrap();
            assert_relative_eq!(left, right, epsilon = 0.005);
        }
    }

    #[test]
    fn test_monotone_in_statistic() {
        let mut previous = 0.0;
        for step in 0..200 {
            let tau = -15.0 + step as f64 * 0.08;
            let p = p_value(tau, 2).unwrap();
            assert!(p >= previous, "p-value decreased at tau={}", tau);
            previous = p;
        }
    }

    #[test]
    fn test_bounds() {
        assert_eq!(p_value(3.0, 1), Some(1.0));
        let extreme = p_value(-40.0, 1).unwrap();
        assert!(extreme > 0.0);
        assert!(extreme < 1e-20);
        assert_eq!(p_value(-40.0, 1), p_value(TAU_MIN[0], 1));
    }

    #[test]
    fn test_unsupported_inputs() {
        assert_eq!(p_value(-2.0, 0), None);
        assert_eq!(p_value(-2.0, 3), None);
        assert_eq!(p_value(f64::NAN, 1), None);
    }

    #[test]
    fn test_critical_values() {
        let cv = critical_values(1, 250).unwrap();
        assert!(cv.one_pct < cv.five_pct && cv.five_pct < cv.ten_pct);
        assert_relative_eq!(cv.five_pct, -2.8727, epsilon = 0.001);

        let cv = critical_values(2, 250).unwrap();
        assert_relative_eq!(cv.five_pct, -3.3607, epsilon = 0.001);
    }
}
