//! Z-Score Engine
//!
//! Rolling standardization of a spread:
//!
//!   z[t] = (s[t] - mean(s[t-W+1..=t])) / std(s[t-W+1..=t])
//!
//! with the sample (n-1) standard deviation. The output keeps the input's
//! index and length. The first W-1 rows are `Insufficient`, and rows whose
//! window has no dispersion are `Flat`.

use chrono::{DateTime, Utc};

use crate::domain::{ZScore, ZScoreSeries};

/// Relative dispersion below which a window counts as flat
const FLAT_TOLERANCE: f64 = 1e-10;

/// Rolling z-score calculator for spread series
#[derive(Debug, Clone, Copy)]
pub struct ZScoreEngine {
    window: usize,
}

impl ZScoreEngine {
    /// `window` must be at least 2 for a sample standard deviation
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Z-score series for one spread column
    pub fn compute(&self, index: &[DateTime<Utc>], spread: &[f64]) -> ZScoreSeries {
        debug_assert_eq!(index.len(), spread.len());
        ZScoreSeries::new(index.to_vec(), self.scores(spread), self.window)
    }

    /// Z-scores without a time index
    pub fn scores(&self, spread: &[f64]) -> Vec<ZScore> {
        let w = self.window;
        (0..spread.len())
            .map(|t| {
                if w < 2 || t + 1 < w {
                    ZScore::Insufficient
                } else {
                    window_score(&spread[t + 1 - w..=t])
                }
            })
            .collect()
    }
}

/// Score of the last element of `window` against the window's statistics
fn window_score(window: &[f64]) -> ZScore {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if !(std_dev > FLAT_TOLERANCE * mean.abs().max(1.0)) {
        return ZScore::Flat;
    }

    match window.last() {
        Some(current) => ZScore::Value((current - mean) / std_dev),
        None => ZScore::Insufficient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn index(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_leading_rows_insufficient() {
        let spread: Vec<f64> = (0..30).map(|i| (i as f64 * 0.4).sin()).collect();
        let series = ZScoreEngine::new(20).compute(&index(30), &spread);

        assert_eq!(series.len(), 30);
        assert!(series.values()[..19].iter().all(|z| *z == ZScore::Insufficient));
        assert!(series.values()[19..].iter().all(|z| z.is_defined()));
        assert_eq!(series.defined_count(), 11);
    }

    #[test]
    fn test_known_window() {
        let spread = [100.0, 101.0, 102.0, 103.0, 104.0, 106.0, 107.0, 108.0, 109.0, 110.0];
        let scores = ZScoreEngine::new(10).scores(&spread);

        // mean 105, sample variance 110/9
        let expected = 5.0 / (110.0_f64 / 9.0).sqrt();
        assert_relative_eq!(scores[9].value().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_spread_is_flat() {
        let scores = ZScoreEngine::new(20).scores(&[0.37; 45]);

        assert!(scores[..19].iter().all(|z| *z == ZScore::Insufficient));
        assert!(scores[19..].iter().all(|z| *z == ZScore::Flat));
    }

    #[test]
    fn test_linear_spread_has_constant_offset() {
        let w = 20;
        let spread: Vec<f64> = (0..60).map(|i| 0.5 + 0.01 * i as f64).collect();
        let scores = ZScoreEngine::new(w).scores(&spread);

        let w = w as f64;
        let expected = ((w - 1.0) / 2.0) / (w * (w + 1.0) / 12.0).sqrt();
        for z in &scores[19..] {
            assert_relative_eq!(z.value().unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sign_follows_deviation() {
        let mut spread = vec![0.0; 19];
        for (i, v) in spread.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 0.01 } else { -0.01 };
        }

        let mut high = spread.clone();
        high.push(0.5);
        let mut low = spread;
        low.push(-0.5);

        let engine = ZScoreEngine::new(20);
        assert!(engine.scores(&high)[19].value().unwrap() > 2.0);
        assert!(engine.scores(&low)[19].value().unwrap() < -2.0);
    }

    #[test]
    fn test_flat_window_recovers() {
        let mut spread = vec![1.0; 10];
        spread.extend([1.5, 0.5, 1.2]);
        let scores = ZScoreEngine::new(5).scores(&spread);

        assert_eq!(scores[9], ZScore::Flat);
        assert!(scores[10].is_defined());
    }

    #[test]
    fn test_short_input() {
        let scores = ZScoreEngine::new(20).scores(&[1.0, 2.0, 3.0]);
        assert_eq!(scores, vec![ZScore::Insufficient; 3]);
        assert!(ZScoreEngine::new(20).scores(&[]).is_empty());
    }
}
