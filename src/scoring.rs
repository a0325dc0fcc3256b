//! Quantile scoring of a single metric column.
//!
//! Values are cut at the 0/20/40/60/80/100th percentiles (linear
//! interpolation between order statistics) and each value receives the
//! 1-based index of its bin. When many values tie, some percentile edges
//! coincide; duplicates are dropped and the column simply ends up with fewer
//! bins, so a heavily tied Frequency column may only score 1 to 3.

use crate::error::{RfmError, RfmResult};
use crate::record::Metric;

/// Number of quantile tiers per metric.
pub const SCORE_BINS: usize = 5;

/// Fitted bin edges for one metric distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileBins {
    /// Strictly increasing edges. A single edge means one bin.
    edges: Vec<f64>,
}

impl QuantileBins {
    /// Fit `n_bins` quantile bins to a set of finite values.
    ///
    /// Returns `None` when `values` is empty or `n_bins` is zero.
    pub fn fit(values: &[f64], n_bins: usize) -> Option<Self> {
        if values.is_empty() || n_bins == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut edges: Vec<f64> = (0..=n_bins)
            .map(|i| percentile(&sorted, i as f64 / n_bins as f64))
            .collect();
        edges.dedup();

        Some(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Effective number of bins after duplicate edges were dropped.
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1).max(1)
    }

    /// 1-based bin of `value`: `edge[i-1] < value <= edge[i]`, with the
    /// lowest edge belonging to bin 1. Values outside the fitted range clamp
    /// to the first or last bin.
    pub fn bin(&self, value: f64) -> u8 {
        let below = self.edges.iter().filter(|&&edge| edge < value).count();
        below.clamp(1, self.bin_count()) as u8
    }
}

/// Linear-interpolated percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = q * last as f64;
    let lower = (position.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Scores of one metric for every customer, aligned with the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScores {
    pub metric: Metric,
    pub bins: QuantileBins,
    /// `None` where the metric was undefined for that customer
    pub scores: Vec<Option<u8>>,
}

/// Bin a metric column and turn bin indexes into 1..=5 scores.
///
/// Undefined and non-finite values are left out of the distribution and
/// get no score. Recency scores are reversed (`6 - bin`) so that 5 is the
/// best score for every metric.
///
/// # Arguments
/// * `metric` - Metric the column holds, which decides the score direction
/// * `values` - One value per customer, `None` where undefined
///
/// # Returns
/// * `MetricScores` with the fitted bins and scores aligned to `values`
pub fn score_metric(metric: Metric, values: &[Option<f64>]) -> RfmResult<MetricScores> {
    let defined: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    let bins = QuantileBins::fit(&defined, SCORE_BINS).ok_or_else(|| RfmError::Scoring {
        metric,
        reason: format!("none of the {} values is defined", values.len()),
    })?;

    if bins.bin_count() < SCORE_BINS {
        log::debug!(
            "{} collapsed to {} bins because of tied values (edges {:?})",
            metric,
            bins.bin_count(),
            bins.edges()
        );
    }

    let scores = values
        .iter()
        .map(|value| {
            value.filter(|v| v.is_finite()).map(|v| {
                let raw = bins.bin(v);
                if metric.is_inverted() {
                    SCORE_BINS as u8 + 1 - raw
                } else {
                    raw
                }
            })
        })
        .collect();

    Ok(MetricScores {
        metric,
        bins,
        scores,
    })
}

/// Fitted bins of all three metrics for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmBins {
    pub recency: QuantileBins,
    pub frequency: QuantileBins,
    pub monetary: QuantileBins,
}

impl RfmBins {
    pub fn get(&self, metric: Metric) -> &QuantileBins {
        match metric {
            Metric::Recency => &self.recency,
            Metric::Frequency => &self.frequency,
            Metric::Monetary => &self.monetary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn scores_of(metric: Metric, values: &[f64]) -> Vec<u8> {
        score_metric(metric, &some(values))
            .unwrap()
            .scores
            .into_iter()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn test_equal_population_bins() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let scores = scores_of(Metric::Monetary, &values);
        assert_eq!(scores, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn test_three_customer_example() {
        assert_eq!(scores_of(Metric::Recency, &[1.0, 30.0, 400.0]), vec![5, 3, 1]);
        assert_eq!(scores_of(Metric::Frequency, &[50.0, 5.0, 1.0]), vec![5, 3, 1]);
        assert_eq!(
            scores_of(Metric::Monetary, &[9000.0, 800.0, 20.0]),
            vec![5, 3, 1]
        );
    }

    #[test]
    fn test_tied_values_collapse_bins() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 5.0, 8.0];
        let result = score_metric(Metric::Frequency, &some(&values)).unwrap();

        let expected = [1.0, 1.4, 3.4, 8.0];
        assert_eq!(result.bins.edges().len(), expected.len());
        for (edge, want) in result.bins.edges().iter().zip(expected) {
            assert!((edge - want).abs() < 1e-9, "edge {edge} != {want}");
        }
        assert_eq!(result.bins.bin_count(), 3);

        let scores: Vec<u8> = result.scores.into_iter().flatten().collect();
        assert_eq!(scores, vec![1, 1, 1, 1, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_constant_column_is_single_bin() {
        assert_eq!(scores_of(Metric::Frequency, &[4.0, 4.0, 4.0]), vec![1, 1, 1]);
        // One bin reversed is still a valid score
        assert_eq!(scores_of(Metric::Recency, &[7.0, 7.0]), vec![5, 5]);
    }

    #[test]
    fn test_recency_extremes() {
        let values = [12.0, 3.0, 250.0, 40.0, 90.0, 7.0, 180.0, 1.0, 365.0, 60.0];
        let scores = scores_of(Metric::Recency, &values);
        assert_eq!(scores[7], 5, "most recent customer");
        assert_eq!(scores[8], 1, "least recent customer");
    }

    #[test]
    fn test_scores_are_monotone() {
        // Deterministic pseudo-random values with plenty of ties
        let mut state: u64 = 0x2545_f491;
        let values: Vec<f64> = (0..200)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) % 40) as f64
            })
            .collect();

        for metric in Metric::ALL {
            let scores = scores_of(metric, &values);
            for (i, &a) in values.iter().enumerate() {
                for (j, &b) in values.iter().enumerate() {
                    if a < b {
                        if metric.is_inverted() {
                            assert!(scores[i] >= scores[j]);
                        } else {
                            assert!(scores[i] <= scores[j]);
                        }
                    }
                }
            }
            assert!(scores.iter().all(|s| (1..=5).contains(s)));
        }
    }

    #[test]
    fn test_undefined_values_are_not_scored() {
        let values = vec![Some(10.0), None, Some(20.0), Some(f64::NAN), Some(30.0)];
        let result = score_metric(Metric::Monetary, &values).unwrap();
        assert_eq!(result.scores[1], None);
        assert_eq!(result.scores[3], None);
        assert_eq!(result.scores.iter().flatten().count(), 3);
    }

    #[test]
    fn test_all_undefined_column_fails() {
        let err = score_metric(Metric::Frequency, &[None, None]).unwrap_err();
        assert!(matches!(
            err,
            RfmError::Scoring {
                metric: Metric::Frequency,
                ..
            }
        ));
        assert!(score_metric(Metric::Recency, &[]).is_err());
    }

    #[test]
    fn test_bin_clamps_out_of_range_values() {
        let bins = QuantileBins::fit(&[1.0, 2.0, 3.0, 4.0, 5.0], SCORE_BINS).unwrap();
        assert_eq!(bins.bin(-100.0), 1);
        assert_eq!(bins.bin(1000.0), 5);
    }
}
