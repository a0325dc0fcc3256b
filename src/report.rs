//! Report assembly: ranking, segment summary and console output.

use crate::extract::{ExtractionIssues, InputSchema};
use crate::record::{ScoredRecord, UnscoredCustomer};
use crate::scoring::RfmBins;
use crate::segment::Segment;

/// Customer count per segment. Every segment is present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    counts: [(Segment, usize); 5],
}

impl SegmentSummary {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        let mut counts = Segment::ALL.map(|segment| (segment, 0));
        for record in records {
            if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == record.segment) {
                entry.1 += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, segment: Segment) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == segment)
            .map_or(0, |&(_, n)| n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&(_, n)| n).sum()
    }

    /// Share of scored customers in `segment`, in percent.
    pub fn percentage(&self, segment: Segment) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(segment) as f64 / total as f64 * 100.0,
        }
    }

    /// Segments from best to worst with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (Segment, usize)> + '_ {
        self.counts.iter().copied()
    }
}

/// Final result of one RFM run.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmReport {
    /// Scored customers, descending by composite code; ties keep input order
    pub records: Vec<ScoredRecord>,
    pub summary: SegmentSummary,
    pub unscored: Vec<UnscoredCustomer>,
    pub issues: ExtractionIssues,
    pub schema: InputSchema,
    pub bins: RfmBins,
}

impl RfmReport {
    /// Rank scored customers and summarize segments.
    ///
    /// `records` must be in input order; the sort is stable so customers
    /// sharing a composite code stay in that order.
    pub fn assemble(
        mut records: Vec<ScoredRecord>,
        unscored: Vec<UnscoredCustomer>,
        issues: ExtractionIssues,
        schema: InputSchema,
        bins: RfmBins,
    ) -> Self {
        records.sort_by(|a, b| b.code.cmp(&a.code));
        let summary = SegmentSummary::from_records(&records);
        Self {
            records,
            summary,
            unscored,
            issues,
            schema,
            bins,
        }
    }

    /// The `n` best customers by composite code.
    pub fn top(&self, n: usize) -> &[ScoredRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn segment_of(&self, customer_id: &str) -> Option<Segment> {
        self.records
            .iter()
            .find(|r| r.customer_id == customer_id)
            .map(|r| r.segment)
    }

    pub fn scored_count(&self) -> usize {
        self.records.len()
    }
}

/// Print the segment summary, exclusions and top customers to stdout.
pub fn print_report(report: &RfmReport, top_n: usize) {
    println!("\n=== Customer Segment Summary ===");
    for (segment, count) in report.summary.iter() {
        println!(
            "  {:<20} {:>6} ({:.1}%)",
            segment.label(),
            count,
            report.summary.percentage(segment)
        );
    }
    println!("  {:<20} {:>6}", "Total scored", report.summary.total());

    if !report.unscored.is_empty() {
        println!("\nUnscored customers: {}", report.unscored.len());
        for customer in report.unscored.iter().take(top_n) {
            let missing: Vec<&str> = customer.missing.iter().map(|m| m.name()).collect();
            println!("  {} (missing {})", customer.customer_id, missing.join(", "));
        }
    }

    let issues = &report.issues;
    if !issues.is_clean() {
        println!("\nExcluded input:");
        println!("  Rows without customer id: {}", issues.rows_missing_customer_id);
        println!("  Unparseable dates:        {}", issues.unparseable_dates);
        println!("  Dated after reference:    {}", issues.future_dated);
        println!("  Invalid amounts:          {}", issues.invalid_amounts);
        println!("  Undefined metric cells:   {}", issues.undefined_metrics);
        println!("  Customers dropped:        {}", issues.dropped_customers.len());
    }

    println!("\n=== Top {} Customers ===", top_n.min(report.records.len()));
    println!(
        "  {:<12} | {:>8} | {:>9} | {:>10} | {:>3} | Segment",
        "Customer", "Recency", "Frequency", "Monetary", "RFM"
    );
    println!("  -------------|----------|-----------|------------|-----|--------");
    for record in report.top(top_n) {
        println!(
            "  {:<12} | {:>8.0} | {:>9} | {:>10.2} | {} | {}",
            record.customer_id,
            record.recency,
            record.frequency,
            record.monetary,
            record.code,
            record.segment
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metric;
    use crate::scoring::{QuantileBins, SCORE_BINS};
    use crate::segment::RfmCode;

    fn scored(id: &str, code: &str) -> ScoredRecord {
        let code: RfmCode = code.parse().unwrap();
        let [r, f, m] = code.scores();
        ScoredRecord {
            customer_id: id.to_string(),
            recency: 1.0,
            frequency: 1,
            monetary: 1.0,
            r_score: r,
            f_score: f,
            m_score: m,
            segment: Segment::classify(&code),
            code,
        }
    }

    fn bins() -> RfmBins {
        let bins = QuantileBins::fit(&[1.0, 2.0], SCORE_BINS).unwrap();
        RfmBins {
            recency: bins.clone(),
            frequency: bins.clone(),
            monetary: bins,
        }
    }

    fn report(records: Vec<ScoredRecord>) -> RfmReport {
        RfmReport::assemble(
            records,
            Vec::new(),
            ExtractionIssues::default(),
            InputSchema::Aggregated,
            bins(),
        )
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let report = report(vec![
            scored("a", "233"),
            scored("b", "555"),
            scored("c", "233"),
            scored("d", "111"),
            scored("e", "555"),
            scored("f", "233"),
        ]);

        let order: Vec<&str> = report.records.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(order, vec!["b", "e", "a", "c", "f", "d"]);
        assert_eq!(report.top(2).len(), 2);
        assert_eq!(report.top(100).len(), 6);
    }

    #[test]
    fn test_summary_lists_every_segment() {
        let report = report(vec![scored("a", "555"), scored("b", "454"), scored("c", "555")]);
        let summary: Vec<(Segment, usize)> = report.summary.iter().collect();

        assert_eq!(
            summary,
            vec![
                (Segment::Champions, 2),
                (Segment::LoyalCustomers, 1),
                (Segment::PotentialLoyalist, 0),
                (Segment::NeedsAttention, 0),
                (Segment::LostCustomers, 0),
            ]
        );
        assert_eq!(report.summary.total(), report.scored_count());
        assert!((report.summary.percentage(Segment::Champions) - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SegmentSummary::from_records(&[]);
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.iter().count(), 5);
        assert_eq!(summary.percentage(Segment::LostCustomers), 0.0);
    }

    #[test]
    fn test_segment_lookup() {
        let report = report(vec![scored("a", "122"), scored("b", "121")]);
        assert_eq!(report.segment_of("a"), Some(Segment::NeedsAttention));
        assert_eq!(report.segment_of("b"), Some(Segment::LostCustomers));
        assert_eq!(report.segment_of("zzz"), None);
        assert_eq!(report.bins.get(Metric::Recency).bin_count(), SCORE_BINS);
    }
}
