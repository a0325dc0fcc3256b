//! Command-line interface definitions and argument parsing

use crate::dates::parse_timestamp;
use crate::extract::InputSchema;
use crate::pipeline::RfmOptions;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Input table layout as chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaArg {
    Auto,
    Aggregated,
    Transactional,
}

impl From<SchemaArg> for InputSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Auto => InputSchema::Auto,
            SchemaArg::Aggregated => InputSchema::Aggregated,
            SchemaArg::Transactional => InputSchema::Transactional,
        }
    }
}

/// Customer segmentation CLI using quantile-based RFM scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: PathBuf,

    /// Path of the per-customer output CSV (overwritten)
    #[arg(short, long, default_value = "rfm_output.csv")]
    pub output: PathBuf,

    /// Base path for chart images
    #[arg(long, default_value = "rfm.png")]
    pub charts: PathBuf,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Date recency is measured from, as YYYY-MM-DD or RFC 3339 (default: now)
    #[arg(short, long)]
    pub reference_date: Option<String>,

    /// Layout of the input table
    #[arg(long, value_enum, default_value = "auto")]
    pub schema: SchemaArg,

    /// Number of top customers to print
    #[arg(short, long, default_value = "10")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the reference date, falling back to the current time.
    pub fn reference_date(&self) -> crate::Result<DateTime<Utc>> {
        match self.reference_date {
            Some(ref value) => parse_timestamp(value)
                .ok_or_else(|| anyhow::anyhow!("Invalid reference date: {}", value)),
            None => Ok(Utc::now()),
        }
    }

    /// Library options for this invocation.
    pub fn pipeline_options(&self) -> crate::Result<RfmOptions> {
        Ok(RfmOptions {
            reference_date: self.reference_date()?,
            schema: self.schema.into(),
        })
    }
}
