//! Error types for the RFM core.
//!
//! All three variants are terminal for a run. Row-level problems are not
//! errors; they are counted in [`crate::extract::ExtractionIssues`].

use crate::record::Metric;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RfmError {
    /// Required input is missing or empty.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// A metric column has nothing to score.
    #[error("scoring failed for {metric}: {reason}")]
    Scoring { metric: Metric, reason: String },

    /// A composite code is not three digits in 1..=5.
    #[error("malformed composite code {code:?}: {reason}")]
    Classification { code: String, reason: String },
}

impl RfmError {
    pub(crate) fn extraction(reason: impl Into<String>) -> Self {
        RfmError::Extraction(reason.into())
    }
}

/// Result type alias for core pipeline operations.
pub type RfmResult<T> = Result<T, RfmError>;
