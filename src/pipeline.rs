//! End-to-end RFM computation: extract, score, classify, assemble.
//!
//! Each stage takes the previous stage's output by reference or value and
//! returns a new record set; nothing is shared between runs.

use crate::data::Table;
use crate::error::RfmResult;
use crate::extract::{extract_customers, InputSchema};
use crate::record::{CustomerRecord, Metric, ScoredRecord, UnscoredCustomer};
use crate::report::RfmReport;
use crate::scoring::{score_metric, RfmBins};
use crate::segment::{RfmCode, Segment};
use chrono::{DateTime, Utc};

/// Run parameters for [`compute_rfm_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmOptions {
    /// Date recency is measured from
    pub reference_date: DateTime<Utc>,
    pub schema: InputSchema,
}

impl Default for RfmOptions {
    fn default() -> Self {
        Self {
            reference_date: Utc::now(),
            schema: InputSchema::Auto,
        }
    }
}

/// Compute the RFM report for `table`, detecting its schema.
pub fn compute_rfm(table: &Table, reference_date: DateTime<Utc>) -> RfmResult<RfmReport> {
    compute_rfm_with(
        table,
        &RfmOptions {
            reference_date,
            schema: InputSchema::Auto,
        },
    )
}

/// Compute the RFM report for `table` with explicit options.
///
/// # Arguments
/// * `table` - Aggregated or transactional input table
/// * `options` - Reference date and input schema
///
/// # Returns
/// * `RfmReport` with ranked records, segment summary and exclusions
pub fn compute_rfm_with(table: &Table, options: &RfmOptions) -> RfmResult<RfmReport> {
    let extraction = extract_customers(table, options.schema, options.reference_date)?;
    let scored = score_customers(&extraction.records)?;

    log::info!(
        "scored {} customers, {} unscored",
        scored.records.len(),
        scored.unscored.len()
    );

    Ok(RfmReport::assemble(
        scored.records,
        scored.unscored,
        extraction.issues,
        extraction.schema,
        scored.bins,
    ))
}

/// Output of the scoring and classification stages, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCustomers {
    pub records: Vec<ScoredRecord>,
    pub unscored: Vec<UnscoredCustomer>,
    pub bins: RfmBins,
}

/// Score every metric independently, then build composite codes and
/// segments for customers with all three scores.
pub fn score_customers(customers: &[CustomerRecord]) -> RfmResult<ScoredCustomers> {
    let column = |metric: Metric| -> Vec<Option<f64>> {
        customers.iter().map(|c| c.metric(metric)).collect()
    };

    let recency = score_metric(Metric::Recency, &column(Metric::Recency))?;
    let frequency = score_metric(Metric::Frequency, &column(Metric::Frequency))?;
    let monetary = score_metric(Metric::Monetary, &column(Metric::Monetary))?;

    let mut records = Vec::with_capacity(customers.len());
    let mut unscored = Vec::new();

    for (i, customer) in customers.iter().enumerate() {
        let scores = (recency.scores[i], frequency.scores[i], monetary.scores[i]);
        let values = (customer.recency, customer.frequency, customer.monetary);

        match (scores, values) {
            ((Some(r), Some(f), Some(m)), (Some(rec), Some(freq), Some(mon))) => {
                records.push(classify(customer, (rec, freq, mon), (r, f, m))?);
            }
            ((r, f, m), _) => {
                let missing = [(Metric::Recency, r), (Metric::Frequency, f), (Metric::Monetary, m)]
                    .into_iter()
                    .filter(|(_, score)| score.is_none())
                    .map(|(metric, _)| metric)
                    .collect();
                unscored.push(UnscoredCustomer {
                    customer_id: customer.customer_id.clone(),
                    missing,
                });
            }
        }
    }

    Ok(ScoredCustomers {
        records,
        unscored,
        bins: RfmBins {
            recency: recency.bins,
            frequency: frequency.bins,
            monetary: monetary.bins,
        },
    })
}

fn classify(
    customer: &CustomerRecord,
    (recency, frequency, monetary): (f64, u64, f64),
    (r_score, f_score, m_score): (u8, u8, u8),
) -> RfmResult<ScoredRecord> {
    let code = RfmCode::from_scores(r_score, f_score, m_score)?;
    let segment = Segment::classify(&code);
    Ok(ScoredRecord {
        customer_id: customer.customer_id.clone(),
        recency,
        frequency,
        monetary,
        r_score,
        f_score,
        m_score,
        code,
        segment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RfmError;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_three_customer_example() {
        let customers = vec![
            CustomerRecord::new("1", 1.0, 50, 9000.0),
            CustomerRecord::new("2", 30.0, 5, 800.0),
            CustomerRecord::new("3", 400.0, 1, 20.0),
        ];
        let scored = score_customers(&customers).unwrap();

        let first = &scored.records[0];
        assert_eq!((first.r_score, first.f_score, first.m_score), (5, 5, 5));
        assert_eq!(first.code.as_str(), "555");
        assert_eq!(first.segment, Segment::Champions);

        let third = &scored.records[2];
        assert_eq!(third.code.as_str(), "111");
        assert_eq!(third.segment, Segment::LostCustomers);
    }

    #[test]
    fn test_customers_with_undefined_metrics_are_unscored() {
        let mut partial = CustomerRecord::new("p", 5.0, 2, 10.0);
        partial.monetary = None;
        let customers = vec![
            CustomerRecord::new("a", 1.0, 3, 100.0),
            partial,
            CustomerRecord::new("b", 9.0, 1, 50.0),
        ];

        let scored = score_customers(&customers).unwrap();
        assert_eq!(scored.records.len(), 2);
        assert_eq!(
            scored.unscored,
            vec![UnscoredCustomer {
                customer_id: "p".to_string(),
                missing: vec![Metric::Monetary],
            }]
        );
    }

    #[test]
    fn test_entirely_undefined_metric_fails() {
        let customers: Vec<CustomerRecord> = (0..3)
            .map(|i| CustomerRecord {
                customer_id: i.to_string(),
                recency: Some(i as f64),
                frequency: None,
                monetary: Some(1.0),
            })
            .collect();
        let err = score_customers(&customers).unwrap_err();
        assert!(matches!(
            err,
            RfmError::Scoring {
                metric: Metric::Frequency,
                ..
            }
        ));
    }

    #[test]
    fn test_compute_rfm_on_aggregated_table() {
        let table = Table::from_rows(
            &["customer_id", "recency", "frequency", "monetary"],
            &[
                &["c1", "1", "50", "9000"],
                &["c2", "30", "5", "800"],
                &["c3", "400", "1", "20"],
            ],
        );
        let report = compute_rfm(&table, reference()).unwrap();

        assert_eq!(report.schema, InputSchema::Aggregated);
        assert_eq!(report.segment_of("c1"), Some(Segment::Champions));
        assert_eq!(report.segment_of("c2"), Some(Segment::PotentialLoyalist));
        assert_eq!(report.segment_of("c3"), Some(Segment::LostCustomers));
        assert_eq!(report.summary.total(), 3);
    }

    #[test]
    fn test_compute_rfm_is_deterministic() {
        let table = Table::from_rows(
            &["customer_id", "transaction_date", "transaction_id", "amount"],
            &[
                &["a", "2024-06-01", "t1", "10.5"],
                &["b", "2024-01-15", "t2", "99.0"],
                &["a", "2024-06-20", "t3", "4.25"],
                &["c", "2023-11-02", "t4", "1.0"],
                &["d", "2024-06-29", "t5", "300"],
            ],
        );
        let first = compute_rfm(&table, reference()).unwrap();
        let second = compute_rfm(&table, reference()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_customer_id_column_fails() {
        let table = Table::from_rows(&["recency", "frequency", "monetary"], &[&["1", "2", "3"]]);
        assert!(matches!(
            compute_rfm(&table, reference()),
            Err(RfmError::Extraction(_))
        ));
    }
}
