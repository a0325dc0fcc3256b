//! SegmentForge: customer segmentation through RFM scoring
//!
//! Each customer's Recency, Frequency and Monetary metrics are scored 1 to 5
//! by quantile, concatenated into a three-digit code such as `"545"`, and
//! mapped to a named segment. The core is a pure batch transform,
//! [`compute_rfm`]; CSV I/O, charts and the CLI sit around it.

pub mod cli;
pub mod data;
pub mod dates;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod scoring;
pub mod segment;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_table, read_table, save_report, write_report, Table};
pub use error::{RfmError, RfmResult};
pub use extract::{extract_customers, Extraction, ExtractionIssues, InputSchema};
pub use pipeline::{compute_rfm, compute_rfm_with, score_customers, RfmOptions};
pub use record::{CustomerRecord, Metric, ScoredRecord, UnscoredCustomer};
pub use report::{print_report, RfmReport, SegmentSummary};
pub use scoring::{score_metric, QuantileBins, RfmBins};
pub use segment::{RfmCode, Segment};
pub use viz::generate_charts;

/// Common result type used by the I/O and CLI layers
pub type Result<T> = anyhow::Result<T>;
