//! Tabular input and the per-customer output artifact, via the `csv` crate

use crate::record::ScoredRecord;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Column order of the output artifact.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "customer_id",
    "Recency",
    "Frequency",
    "Monetary",
    "R_Score",
    "F_Score",
    "M_Score",
    "RFM_Score",
    "Segment",
];

/// In-memory input table with normalized headers.
///
/// Cells are kept as trimmed strings; a blank cell is null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, normalizing headers and trimming cells.
    pub fn new<H: AsRef<str>>(headers: &[H], rows: Vec<Vec<String>>) -> Self {
        let columns = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.trim().to_string()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor from string slices.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_header(name);
        self.columns.iter().position(|c| *c == name)
    }

    /// Index of the first column matching any of `aliases`, in alias order.
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| self.column_index(alias))
    }

    /// Cell value, or `None` when blank or out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Trim and lower-case a header so lookups ignore case and padding.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Read a CSV table with a header row.
pub fn read_table<R: Read>(reader: R) -> crate::Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at line {}", line_num + 2))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(&headers, rows))
}

/// Load a CSV table from a file path.
pub fn load_table(path: impl AsRef<Path>) -> crate::Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    read_table(file)
}

#[derive(Serialize)]
struct OutputRow<'a> {
    customer_id: &'a str,
    recency: f64,
    frequency: u64,
    monetary: f64,
    r_score: u8,
    f_score: u8,
    m_score: u8,
    rfm_score: &'a str,
    segment: &'static str,
}

impl<'a> From<&'a ScoredRecord> for OutputRow<'a> {
    fn from(record: &'a ScoredRecord) -> Self {
        Self {
            customer_id: &record.customer_id,
            recency: record.recency,
            frequency: record.frequency,
            monetary: record.monetary,
            r_score: record.r_score,
            f_score: record.f_score,
            m_score: record.m_score,
            rfm_score: record.code.as_str(),
            segment: record.segment.label(),
        }
    }
}

/// Write scored records as CSV, in the order given.
///
/// The header row is always written, even for an empty record set.
pub fn write_report<W: Write>(writer: W, records: &[ScoredRecord]) -> crate::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        csv_writer.serialize(OutputRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the output artifact to `path`, replacing any previous file.
pub fn save_report(path: impl AsRef<Path>, records: &[ScoredRecord]) -> crate::Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    write_report(file, records).with_context(|| format!("failed to write '{}'", path.display()))
}
