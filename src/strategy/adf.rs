//! Augmented Dickey-Fuller Test
//!
//! Regresses the first difference of a series on its lagged level, optional
//! constant, and lagged differences:
//!
//!   dx[t] = c + g * x[t] + sum_j a_j * dx[t-j] + e[t]
//!
//! The test statistic is the t-value of `g`. Under the null the series has a
//! unit root, so a strongly negative statistic (small p-value) means the
//! series is stationary.
//!
//! Lag length defaults to `ceil(12 * (nobs/100)^(1/4))`, capped so at least
//! half the sample remains, and is picked by information criterion with every
//! candidate fitted on the same trimmed sample.

use nalgebra::DMatrix;
use tracing::trace;

use crate::strategy::error::StatError;
use crate::strategy::mackinnon::{self, CriticalValues};
use crate::strategy::ols::{self, OlsFit};
use crate::strategy::params::LagSelection;

/// Deterministic terms in the test regression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Constant only
    Constant,
    /// No deterministic terms (used on regression residuals)
    None,
}

impl Trend {
    fn columns(self) -> usize {
        match self {
            Trend::Constant => 1,
            Trend::None => 0,
        }
    }
}

/// Raw ADF regression output, before a p-value is attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfRegression {
    /// t-value of the lagged level coefficient
    pub statistic: f64,
    /// Number of lagged differences in the final regression
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

/// Result of a single-series ADF test with a constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

impl AdfResult {
    /// True if the unit-root null is rejected at `alpha`
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// ADF test with a constant term and MacKinnon p-value.
pub fn adf_test(series: &[f64], lags: LagSelection) -> Result<AdfResult, StatError> {
    let regression = adf_regression(series, Trend::Constant, lags)?;

    let p_value = mackinnon::p_value(regression.statistic, 1).ok_or(StatError::UndefinedStatistic)?;
    let critical_values =
        mackinnon::critical_values(1, regression.nobs).ok_or(StatError::UndefinedStatistic)?;

    Ok(AdfResult {
        statistic: regression.statistic,
        p_value,
        used_lag: regression.used_lag,
        nobs: regression.nobs,
        critical_values,
    })
}

/// Run the ADF regression and return its statistic without a p-value.
///
/// The distribution of the statistic depends on what produced the series
/// (a raw series vs. regression residuals), so callers pick the surface.
pub fn adf_regression(
    series: &[f64],
    trend: Trend,
    lags: LagSelection,
) -> Result<AdfRegression, StatError> {
    let nobs = series.len();
    let ntrend = trend.columns();

    if let Some(row) = series.iter().position(|v| !v.is_finite()) {
        return Err(StatError::NonFinite(row));
    }

    let lag_bound = (nobs / 2) as isize - ntrend as isize - 1;
    if lag_bound < 0 {
        return Err(StatError::InsufficientData {
            required: 2 * (ntrend + 1),
            actual: nobs,
        });
    }
    let lag_bound = lag_bound as usize;

    let (min, max) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if min == max {
        return Err(StatError::ConstantSeries);
    }

    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let used_lag = match lags {
        LagSelection::Fixed(p) => {
            if p > lag_bound {
                return Err(StatError::InsufficientData {
                    required: 2 * (p + ntrend + 1),
                    actual: nobs,
                });
            }
            p
        }
        LagSelection::Aic | LagSelection::Bic => {
            let max_lag = default_max_lag(nobs).min(lag_bound);
            select_lag(series, &diffs, trend, max_lag, lags)?
        }
    };

    let (y, design) = build_design(series, &diffs, trend, used_lag, used_lag);
    let fit = ols::fit(&y, &design, trend == Trend::Constant)?;
    let statistic = fit.t_value(ntrend);

    if statistic.is_nan() {
        return Err(StatError::UndefinedStatistic);
    }

    Ok(AdfRegression {
        statistic,
        used_lag,
        nobs: fit.nobs(),
    })
}

/// Schwert's rule: ceil(12 * (nobs / 100)^(1/4))
pub fn default_max_lag(nobs: usize) -> usize {
    (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Fit lags 0..=max_lag on the sample trimmed for `max_lag` and keep the
/// lowest criterion. Ties go to the shorter lag.
fn select_lag(
    series: &[f64],
    diffs: &[f64],
    trend: Trend,
    max_lag: usize,
    criterion: LagSelection,
) -> Result<usize, StatError> {
    let (y, full) = build_design(series, diffs, trend, max_lag, max_lag);
    let base = trend.columns() + 1;

    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let design = full.columns(0, base + lag).into_owned();
        let fit = ols::fit(&y, &design, trend == Trend::Constant)?;
        let score = information_criterion(&fit, criterion);

        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, lag));
        }
    }

    let (score, lag) = best.ok_or(StatError::InsufficientData {
        required: base + 1,
        actual: y.len(),
    })?;
    trace!("ADF lag selection: lag={} criterion={:.4} (max {})", lag, score, max_lag);
    Ok(lag)
}

fn information_criterion(fit: &OlsFit, criterion: LagSelection) -> f64 {
    match criterion {
        LagSelection::Bic => fit.bic(),
        _ => fit.aic(),
    }
}

/// Regressand and design for the ADF regression.
///
/// Rows start at `trim` so that every lag up to `trim` is available. Columns
/// are [constant], lagged level, then `lags` lagged differences.
fn build_design(
    series: &[f64],
    diffs: &[f64],
    trend: Trend,
    trim: usize,
    lags: usize,
) -> (Vec<f64>, DMatrix<f64>) {
    let rows = diffs.len().saturating_sub(trim);
    let ntrend = trend.columns();
    let cols = ntrend + 1 + lags;

    let y: Vec<f64> = (0..rows).map(|r| diffs[r + trim]).collect();
    let design = DMatrix::from_fn(rows, cols, |r, c| {
        let t = r + trim;
        if c < ntrend {
            1.0
        } else if c == ntrend {
            series[t]
        } else {
            diffs[t - (c - ntrend)]
        }
    });

    (y, design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand::distributions::Distribution;
    use statrs::distribution::Normal;

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut x = Vec::with_capacity(n);
        let mut level = 0.0;
        for _ in 0..n {
            level = phi * level + noise.sample(&mut rng);
            x.push(level);
        }
        x
    }

    #[test]
    fn test_stationary_series_rejects_unit_root() {
        let series = ar1(250, 0.5, 7);
        let result = adf_test(&series, LagSelection::Aic).unwrap();

        assert!(result.statistic < result.critical_values.one_pct);
        assert!(result.is_stationary(0.01));
        assert!(result.used_lag <= default_max_lag(250));
    }

    #[test]
    fn test_random_walk_keeps_unit_root() {
        let mut non_rejections = 0;
        for seed in 0..10 {
            let walk = ar1(250, 1.0, 100 + seed);
            let result = adf_test(&walk, LagSelection::Aic).unwrap();
            if !result.is_stationary(0.05) {
                non_rejections += 1;
            }
        }
        assert!(non_rejections >= 7, "only {} walks kept the unit root", non_rejections);
    }

    #[test]
    fn test_bic_never_picks_a_longer_lag_than_aic() {
        for seed in 20..26 {
            let series = ar1(250, 0.6, seed);
            let aic = adf_test(&series, LagSelection::Aic).unwrap();
            let bic = adf_test(&series, LagSelection::Bic).unwrap();

            assert!(
                bic.used_lag <= aic.used_lag,
                "seed {}: bic lag {} > aic lag {}",
                seed,
                bic.used_lag,
                aic.used_lag
            );
            assert!(bic.is_stationary(0.05));
            assert_eq!(bic.nobs, 249 - bic.used_lag);
        }
    }

    #[test]
    fn test_fixed_lag_sample_size() {
        let series = ar1(100, 0.3, 3);
        let result = adf_test(&series, LagSelection::Fixed(2)).unwrap();

        assert_eq!(result.used_lag, 2);
        // 99 differences, 2 lost to lags
        assert_eq!(result.nobs, 97);
    }

    #[test]
    fn test_zero_lag_matches_direct_regression() {
        let series = ar1(60, 0.2, 11);
        let result = adf_regression(&series, Trend::Constant, LagSelection::Fixed(0)).unwrap();

        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let design = DMatrix::from_fn(59, 2, |r, c| if c == 0 { 1.0 } else { series[r] });
        let direct = ols::fit(&diffs, &design, true).unwrap();

        approx::assert_relative_eq!(result.statistic, direct.t_value(1), epsilon = 1e-10);
        assert_eq!(result.nobs, 59);
    }

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(100), 12);
        assert_eq!(default_max_lag(250), 16);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert!(matches!(
            adf_test(&[1.0, 2.0, 3.0], LagSelection::Aic),
            Err(StatError::InsufficientData { .. })
        ));
        assert_eq!(adf_test(&[5.0; 40], LagSelection::Aic), Err(StatError::ConstantSeries));

        let mut series = ar1(40, 0.5, 1);
        series[17] = f64::NAN;
        assert_eq!(adf_test(&series, LagSelection::Aic), Err(StatError::NonFinite(17)));
    }

    #[test]
    fn test_fixed_lag_too_long() {
        let series = ar1(20, 0.5, 5);
        assert!(matches!(
            adf_test(&series, LagSelection::Fixed(9)),
            Err(StatError::InsufficientData { .. })
        ));
    }
}
