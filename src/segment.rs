//! Composite RFM codes and their mapping to marketing segments.

use crate::error::{RfmError, RfmResult};
use std::fmt;
use std::str::FromStr;

/// Lowest and highest digit a well-formed code may contain.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Three-character composite code formed from the R, F and M scores.
///
/// Codes compare as strings. Every code holds exactly three digits in
/// `1..=5`, so string order matches the numeric order of the 3-digit value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RfmCode(String);

impl RfmCode {
    /// Concatenate three scores in R, F, M order.
    pub fn from_scores(r: u8, f: u8, m: u8) -> RfmResult<Self> {
        format!("{r}{f}{m}").parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three scores as integers, in R, F, M order.
    pub fn scores(&self) -> [u8; 3] {
        let bytes = self.0.as_bytes();
        [bytes[0] - b'0', bytes[1] - b'0', bytes[2] - b'0']
    }
}

impl FromStr for RfmCode {
    type Err = RfmError;

    fn from_str(code: &str) -> RfmResult<Self> {
        let malformed = |reason: &str| RfmError::Classification {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        if code.chars().count() != 3 {
            return Err(malformed("expected exactly 3 characters"));
        }
        let in_range = code
            .bytes()
            .all(|b| (b'0' + MIN_SCORE..=b'0' + MAX_SCORE).contains(&b));
        if !in_range {
            return Err(malformed("every character must be a digit from 1 to 5"));
        }
        Ok(RfmCode(code.to_string()))
    }
}

impl fmt::Display for RfmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marketing segment, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Champions,
    LoyalCustomers,
    PotentialLoyalist,
    NeedsAttention,
    LostCustomers,
}

/// Inclusive lower bounds, checked top to bottom. Codes below the last
/// bound fall through to [`Segment::LostCustomers`].
const SEGMENT_THRESHOLDS: [(&str, Segment); 4] = [
    ("455", Segment::Champions),
    ("344", Segment::LoyalCustomers),
    ("233", Segment::PotentialLoyalist),
    ("122", Segment::NeedsAttention),
];

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Champions,
        Segment::LoyalCustomers,
        Segment::PotentialLoyalist,
        Segment::NeedsAttention,
        Segment::LostCustomers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::PotentialLoyalist => "Potential Loyalist",
            Segment::NeedsAttention => "Needs Attention",
            Segment::LostCustomers => "Lost Customers",
        }
    }

    /// Classify a composite code. Total over all well-formed codes.
    pub fn classify(code: &RfmCode) -> Segment {
        SEGMENT_THRESHOLDS
            .iter()
            .find(|(bound, _)| code.as_str() >= *bound)
            .map(|&(_, segment)| segment)
            .unwrap_or(Segment::LostCustomers)
    }

    /// Validate a raw code string and classify it.
    pub fn classify_str(code: &str) -> RfmResult<Segment> {
        let code: RfmCode = code.parse()?;
        Ok(Segment::classify(&code))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
