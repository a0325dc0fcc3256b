//! Charts of an RFM run using Plotters

use crate::record::ScoredRecord;
use crate::report::{RfmReport, SegmentSummary};
use crate::segment::Segment;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Color per segment, best to worst
const SEGMENT_COLORS: [RGBColor; 5] = [
    RGBColor(46, 139, 87),
    RGBColor(65, 105, 225),
    RGBColor(0, 170, 190),
    RGBColor(230, 160, 30),
    RGBColor(200, 50, 50),
];

/// Number of buckets in the frequency histogram
pub const FREQUENCY_BUCKETS: usize = 10;

fn segment_color(segment: Segment) -> RGBColor {
    let idx = Segment::ALL
        .iter()
        .position(|&s| s == segment)
        .unwrap_or(Segment::ALL.len() - 1);
    SEGMENT_COLORS[idx]
}

/// Output files produced by [`generate_charts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPaths {
    pub segments: PathBuf,
    pub recency_monetary: PathBuf,
    pub frequency: PathBuf,
}

impl ChartPaths {
    /// Derive chart file names from a base path, e.g. `rfm.png` becomes
    /// `rfm_segments.png`, `rfm_recency_monetary.png` and `rfm_frequency.png`.
    pub fn from_base(base: &Path) -> Self {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("rfm");
        let ext = base.extension().and_then(|e| e.to_str()).unwrap_or("png");
        let with_suffix = |suffix: &str| base.with_file_name(format!("{stem}_{suffix}.{ext}"));

        Self {
            segments: with_suffix("segments"),
            recency_monetary: with_suffix("recency_monetary"),
            frequency: with_suffix("frequency"),
        }
    }
}

/// One bar of a histogram, covering `lower..upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram. The last bucket includes the maximum.
pub fn histogram(values: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    if values.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / buckets as f64 } else { 1.0 };

    let mut result: Vec<HistogramBucket> = (0..buckets)
        .map(|i| HistogramBucket {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for &value in values {
        let idx = (((value - min) / width).floor() as usize).min(buckets - 1);
        result[idx].count += 1;
    }
    result
}

/// Axis bounds around `values` with 5% padding on each side.
pub fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

/// Bar chart of customers per segment.
pub fn create_segment_chart(summary: &SegmentSummary, output_path: &Path) -> crate::Result<()> {
    let counts: Vec<(Segment, usize)> = summary.iter().collect();
    let max_count = counts.iter().map(|&(_, n)| n).max().unwrap_or(0).max(1) as u32;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Segmentation Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0u32..counts.len() as u32).into_segmented(),
            0u32..(max_count + max_count / 10 + 1),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Segment")
        .y_desc("Number of Customers")
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(idx) => Segment::ALL
                .get(*idx as usize)
                .map(|s| s.label().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (idx, &(segment, count)) in counts.iter().enumerate() {
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(segment_color(segment).filled())
                .margin(20)
                .data(std::iter::once((idx as u32, count as u32))),
        )?;
    }

    root.present()?;
    log::info!("segment chart saved to {}", output_path.display());
    Ok(())
}

/// Scatter plot of recency against monetary value, colored by segment.
pub fn create_recency_monetary_chart(
    records: &[ScoredRecord],
    output_path: &Path,
) -> crate::Result<()> {
    let (x_min, x_max) = padded_range(records.iter().map(|r| r.recency));
    let (y_min, y_max) = padded_range(records.iter().map(|r| r.monetary));

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Recency vs Monetary", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Recency (days)")
        .y_desc("Monetary")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for segment in Segment::ALL {
        let color = segment_color(segment);
        chart
            .draw_series(
                records
                    .iter()
                    .filter(|r| r.segment == segment)
                    .map(|r| Circle::new((r.recency, r.monetary), 4, color.filled())),
            )?
            .label(segment.label())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    log::info!("recency/monetary chart saved to {}", output_path.display());
    Ok(())
}

/// Histogram of purchase frequency.
pub fn create_frequency_chart(records: &[ScoredRecord], output_path: &Path) -> crate::Result<()> {
    let frequencies: Vec<f64> = records.iter().map(|r| r.frequency as f64).collect();
    let buckets = histogram(&frequencies, FREQUENCY_BUCKETS);
    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let x_min = buckets.first().map_or(0.0, |b| b.lower);
    let x_max = buckets.last().map_or(1.0, |b| b.upper);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Frequency Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Frequency")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(buckets.iter().map(|b| {
        Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    log::info!("frequency chart saved to {}", output_path.display());
    Ok(())
}

/// Render all charts next to `base_path`.
///
/// # Arguments
/// * `report` - Completed RFM report
/// * `base_path` - Path the chart file names are derived from
///
/// # Returns
/// * `ChartPaths` of the three PNG files written
pub fn generate_charts(report: &RfmReport, base_path: &Path) -> crate::Result<ChartPaths> {
    let paths = ChartPaths::from_base(base_path);

    create_segment_chart(&report.summary, &paths.segments)?;
    create_recency_monetary_chart(&report.records, &paths.recency_monetary)?;
    create_frequency_chart(&report.records, &paths.frequency)?;

    Ok(paths)
}
