//! Per-customer record types flowing between pipeline stages.

use crate::segment::{RfmCode, Segment};
use std::fmt;

/// One of the three RFM metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Recency, Metric::Frequency, Metric::Monetary];

    /// Smaller raw values are better for recency, so its scores are reversed.
    pub fn is_inverted(self) -> bool {
        matches!(self, Metric::Recency)
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Recency => "Recency",
            Metric::Frequency => "Frequency",
            Metric::Monetary => "Monetary",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw RFM metrics for one customer.
///
/// A metric is `None` when the input could not define it (blank or invalid
/// cell in a pre-aggregated table). Such customers are kept out of that
/// metric's distribution and reported as unscored.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    /// Whole days since the most recent qualifying transaction
    pub recency: Option<f64>,
    /// Number of qualifying transactions
    pub frequency: Option<u64>,
    /// Total value of qualifying transactions
    pub monetary: Option<f64>,
}

impl CustomerRecord {
    pub fn new(customer_id: impl Into<String>, recency: f64, frequency: u64, monetary: f64) -> Self {
        Self {
            customer_id: customer_id.into(),
            recency: Some(recency),
            frequency: Some(frequency),
            monetary: Some(monetary),
        }
    }

    /// Metric value as a float, ready for quantile binning.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Recency => self.recency,
            Metric::Frequency => self.frequency.map(|f| f as f64),
            Metric::Monetary => self.monetary,
        }
    }

    /// Metrics this record leaves undefined.
    pub fn missing_metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|&m| self.metric(m).is_none())
            .collect()
    }
}

/// A fully scored customer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub customer_id: String,
    pub recency: f64,
    pub frequency: u64,
    pub monetary: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub code: RfmCode,
    pub segment: Segment,
}

impl ScoredRecord {
    pub fn score(&self, metric: Metric) -> u8 {
        match metric {
            Metric::Recency => self.r_score,
            Metric::Frequency => self.f_score,
            Metric::Monetary => self.m_score,
        }
    }
}

/// A customer left out of scoring because one or more metrics are undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnscoredCustomer {
    pub customer_id: String,
    pub missing: Vec<Metric>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metrics() {
        let record = CustomerRecord {
            customer_id: "c1".to_string(),
            recency: None,
            frequency: Some(3),
            monetary: None,
        };
        assert_eq!(record.missing_metrics(), vec![Metric::Recency, Metric::Monetary]);
        assert_eq!(record.metric(Metric::Frequency), Some(3.0));

        let full = CustomerRecord::new("c2", 10.0, 2, 99.5);
        assert!(full.missing_metrics().is_empty());
    }

    #[test]
    fn test_only_recency_is_inverted() {
        assert!(Metric::Recency.is_inverted());
        assert!(!Metric::Frequency.is_inverted());
        assert!(!Metric::Monetary.is_inverted());
    }
}
