//! Ordinary Least Squares
//!
//! Small dense OLS used by the hedge-ratio estimator and both unit-root
//! regressions. Solves the normal equations through a Cholesky factorization
//! of X'X, which also gives the coefficient covariance for t-statistics.

use nalgebra::{DMatrix, DVector};

use crate::strategy::error::StatError;

const LN_2PI: f64 = 1.837_877_066_409_345_5;
/// Smallest Cholesky pivot, relative to the largest, accepted as full rank
const RANK_TOLERANCE: f64 = 1e-8;

/// Fitted OLS model
#[derive(Debug, Clone)]
pub struct OlsFit {
    params: DVector<f64>,
    std_errors: DVector<f64>,
    residuals: Vec<f64>,
    ssr: f64,
    tss: f64,
    nobs: usize,
}

impl OlsFit {
    /// Estimated coefficients, in design-matrix column order
    pub fn params(&self) -> &DVector<f64> {
        &self.params
    }

    pub fn std_errors(&self) -> &DVector<f64> {
        &self.std_errors
    }

    /// t-statistic of coefficient `i`
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Sum of squared residuals
    pub fn ssr(&self) -> f64 {
        self.ssr
    }

    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Number of estimated coefficients
    pub fn k(&self) -> usize {
        self.params.len()
    }

    /// Coefficient of determination. Centered when the design has a constant.
    /// A constant regressand is reported as a perfect fit.
    pub fn rsquared(&self) -> f64 {
        if self.tss <= 0.0 {
            return 1.0;
        }
        1.0 - self.ssr / self.tss
    }

    /// Gaussian log-likelihood at the OLS estimate
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * (LN_2PI + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.k() as f64
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + (self.nobs as f64).ln() * self.k() as f64
    }
}

/// Fit `y = X b + e`. `has_constant` selects the centered total sum of squares.
pub fn fit(y: &[f64], x: &DMatrix<f64>, has_constant: bool) -> Result<OlsFit, StatError> {
    let nobs = y.len();
    let k = x.ncols();

    if x.nrows() != nobs {
        return Err(StatError::LengthMismatch {
            left: nobs,
            right: x.nrows(),
        });
    }
    if nobs <= k {
        return Err(StatError::InsufficientData {
            required: k + 1,
            actual: nobs,
        });
    }
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(StatError::NonFinite(row));
    }

    let y_vec = DVector::from_column_slice(y);
    let xtx = x.transpose() * x;
    let xty = x.transpose() * &y_vec;

    let cholesky = xtx.cholesky().ok_or(StatError::SingularDesign)?;
    let pivots = cholesky.l_dirty().diagonal();
    if !(pivots.min() > pivots.max() * RANK_TOLERANCE) {
        return Err(StatError::SingularDesign);
    }
    let xtx_inv = cholesky.inverse();
    let params = &xtx_inv * xty;
    if params.iter().any(|p| !p.is_finite()) {
        return Err(StatError::SingularDesign);
    }

    let fitted = x * &params;
    let residuals: Vec<f64> = (&y_vec - fitted).iter().copied().collect();
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();

    let tss = if has_constant {
        let mean = y.iter().sum::<f64>() / nobs as f64;
        y.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        y.iter().map(|v| v * v).sum()
    };

    let sigma2 = ssr / (nobs - k) as f64;
    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()));

    Ok(OlsFit {
        params,
        std_errors,
        residuals,
        ssr,
        tss,
        nobs,
    })
}

/// Slope of `x` regressed on `y` with no intercept: sum(x*y) / sum(y*y)
pub fn slope_through_origin(x: &[f64], y: &[f64]) -> Result<f64, StatError> {
    if x.len() != y.len() {
        return Err(StatError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.is_empty() {
        return Err(StatError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let syy: f64 = y.iter().map(|b| b * b).sum();

    if syy <= 0.0 || !syy.is_finite() {
        return Err(StatError::SingularDesign);
    }
    Ok(sxy / syy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_recovers_line() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = xs.iter().map(|x| 3.0 + 2.0 * x).collect();
        let design = DMatrix::from_fn(xs.len(), 2, |i, j| if j == 0 { 1.0 } else { xs[i] });

        let fit = fit(&y, &design, true).unwrap();

        assert_relative_eq!(fit.params()[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.params()[1], 2.0, epsilon = 1e-9);
        assert!(fit.ssr() < 1e-18);
        assert_relative_eq!(fit.rsquared(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standard_errors() {
        // y = [1, 3, 2, 4] on [1, x] with x = [0, 1, 2, 3]
        let y = [1.0, 3.0, 2.0, 4.0];
        let design = DMatrix::from_fn(4, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });

        let fit = fit(&y, &design, true).unwrap();

        // slope 0.8, intercept 1.3, ssr 1.8, sigma2 0.9, Sxx 5
        assert_relative_eq!(fit.params()[1], 0.8, epsilon = 1e-12);
        assert_relative_eq!(fit.params()[0], 1.3, epsilon = 1e-12);
        assert_relative_eq!(fit.ssr(), 1.8, epsilon = 1e-12);
        assert_relative_eq!(fit.std_errors()[1], (0.9_f64 / 5.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(fit.t_value(1), 0.8 / (0.18_f64).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_information_criteria() {
        let y = [1.0, 3.0, 2.0, 4.0];
        let design = DMatrix::from_fn(4, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
        let fit = fit(&y, &design, true).unwrap();

        let llf = -2.0 * (LN_2PI + (1.8_f64 / 4.0).ln() + 1.0);
        assert_relative_eq!(fit.log_likelihood(), llf, epsilon = 1e-12);
        assert_relative_eq!(fit.aic(), -2.0 * llf + 4.0, epsilon = 1e-12);
        assert_relative_eq!(fit.bic(), -2.0 * llf + 4.0_f64.ln() * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_design() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let design = DMatrix::from_fn(4, 2, |_, _| 1.0);
        assert_eq!(fit(&y, &design, true).unwrap_err(), StatError::SingularDesign);
    }

    #[test]
    fn test_too_few_rows() {
        let y = [1.0, 2.0];
        let design = DMatrix::from_fn(2, 2, |i, j| (i + j) as f64);
        assert!(matches!(
            fit(&y, &design, false),
            Err(StatError::InsufficientData { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_slope_through_origin() {
        let y = [1.0, 2.0, 3.0];
        let x = [2.0, 4.0, 6.0];
        assert_relative_eq!(slope_through_origin(&x, &y).unwrap(), 2.0, epsilon = 1e-12);

        assert_eq!(
            slope_through_origin(&[1.0, 2.0], &[0.0, 0.0]),
            Err(StatError::SingularDesign)
        );
    }
}
