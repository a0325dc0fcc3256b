//! Metric extraction: one [`CustomerRecord`] per customer, from either a
//! pre-aggregated table or raw transactions.

use crate::data::Table;
use crate::dates::{days_between, parse_timestamp};
use crate::error::{RfmError, RfmResult};
use crate::record::CustomerRecord;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

const CUSTOMER_ID: &[&str] = &["customer_id", "customerid"];
const RECENCY: &[&str] = &["recency", "signup_days_ago", "days_since_last_purchase"];
const FREQUENCY: &[&str] = &["frequency", "total_transactions"];
const MONETARY: &[&str] = &["monetary", "total_spend"];
const TRANSACTION_DATE: &[&str] = &["transaction_date", "invoicedate", "invoice_date"];
const TRANSACTION_ID: &[&str] = &["transaction_id", "invoiceno", "invoice_no"];
const AMOUNT: &[&str] = &["amount", "total_amount"];
const QUANTITY: &[&str] = &["quantity"];
const UNIT_PRICE: &[&str] = &["unitprice", "unit_price"];

/// Layout of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSchema {
    /// Aggregated when recency, frequency and monetary columns exist,
    /// transactional otherwise
    #[default]
    Auto,
    /// One row per customer with metrics already computed
    Aggregated,
    /// One row per transaction line
    Transactional,
}

/// Row-level problems that were excluded instead of failing the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionIssues {
    pub rows_missing_customer_id: usize,
    pub unparseable_dates: usize,
    /// Transactions dated after the reference date
    pub future_dated: usize,
    pub invalid_amounts: usize,
    /// Blank or invalid metric cells in a pre-aggregated table
    pub undefined_metrics: usize,
    /// Customers left without any qualifying transaction
    pub dropped_customers: Vec<String>,
}

impl ExtractionIssues {
    /// Input rows excluded from aggregation.
    pub fn excluded_rows(&self) -> usize {
        self.rows_missing_customer_id
            + self.unparseable_dates
            + self.future_dated
            + self.invalid_amounts
    }

    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Output of the extraction stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Schema actually used, never `Auto`
    pub schema: InputSchema,
    /// Customers in order of first appearance
    pub records: Vec<CustomerRecord>,
    pub issues: ExtractionIssues,
}

/// Derive per-customer metrics from `table`.
///
/// Fails when the table is empty, has no customer id column, or that column
/// holds no value at all.
///
/// # Arguments
/// * `table` - Input table with normalized headers
/// * `schema` - Table layout, or `Auto` to detect it from the columns
/// * `reference_date` - Date recency is measured from
///
/// # Returns
/// * `Extraction` with one record per customer and the excluded-row counts
pub fn extract_customers(
    table: &Table,
    schema: InputSchema,
    reference_date: DateTime<Utc>,
) -> RfmResult<Extraction> {
    if table.is_empty() {
        return Err(RfmError::extraction("input table has no rows"));
    }

    let id_col = table.find_column(CUSTOMER_ID).ok_or_else(|| {
        RfmError::extraction(format!(
            "missing customer identifier column (expected one of: {})",
            CUSTOMER_ID.join(", ")
        ))
    })?;
    if (0..table.height()).all(|row| table.cell(row, id_col).is_none()) {
        return Err(RfmError::extraction("customer identifier column is entirely empty"));
    }

    let schema = resolve_schema(table, schema);
    log::debug!("extracting customers from {} rows as {:?}", table.height(), schema);

    let extraction = match schema {
        InputSchema::Transactional => extract_transactions(table, id_col, reference_date)?,
        _ => extract_aggregated(table, id_col)?,
    };

    report_issues(&extraction.issues);
    log::info!(
        "extracted {} customers ({} rows excluded)",
        extraction.records.len(),
        extraction.issues.excluded_rows()
    );

    Ok(extraction)
}

fn resolve_schema(table: &Table, requested: InputSchema) -> InputSchema {
    match requested {
        InputSchema::Auto => {
            let aggregated = [RECENCY, FREQUENCY, MONETARY]
                .iter()
                .all(|aliases| table.find_column(aliases).is_some());
            if aggregated {
                InputSchema::Aggregated
            } else {
                InputSchema::Transactional
            }
        }
        explicit => explicit,
    }
}

fn required_column(table: &Table, name: &str, aliases: &[&str]) -> RfmResult<usize> {
    table.find_column(aliases).ok_or_else(|| {
        RfmError::extraction(format!(
            "missing required column '{}' (accepted names: {})",
            name,
            aliases.join(", ")
        ))
    })
}

fn extract_aggregated(table: &Table, id_col: usize) -> RfmResult<Extraction> {
    let recency_col = required_column(table, "recency", RECENCY)?;
    let frequency_col = required_column(table, "frequency", FREQUENCY)?;
    let monetary_col = required_column(table, "monetary", MONETARY)?;

    let mut issues = ExtractionIssues::default();
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in 0..table.height() {
        let Some(customer_id) = table.cell(row, id_col) else {
            issues.rows_missing_customer_id += 1;
            continue;
        };
        if !seen.insert(customer_id) {
            return Err(RfmError::extraction(format!(
                "duplicate customer_id '{}' at data row {}",
                customer_id,
                row + 1
            )));
        }

        let recency = table.cell(row, recency_col).and_then(parse_non_negative);
        let frequency = table.cell(row, frequency_col).and_then(parse_count);
        let monetary = table.cell(row, monetary_col).and_then(parse_finite);

        issues.undefined_metrics += [recency.is_none(), frequency.is_none(), monetary.is_none()]
            .iter()
            .filter(|&&missing| missing)
            .count();

        records.push(CustomerRecord {
            customer_id: customer_id.to_string(),
            recency,
            frequency,
            monetary,
        });
    }

    Ok(Extraction {
        schema: InputSchema::Aggregated,
        records,
        issues,
    })
}

/// How a transaction's amount is read.
enum AmountSource {
    Column(usize),
    QuantityTimesPrice { quantity: usize, price: usize },
}

impl AmountSource {
    fn resolve(table: &Table) -> RfmResult<Self> {
        if let Some(col) = table.find_column(AMOUNT) {
            return Ok(AmountSource::Column(col));
        }
        match (table.find_column(QUANTITY), table.find_column(UNIT_PRICE)) {
            (Some(quantity), Some(price)) => Ok(AmountSource::QuantityTimesPrice { quantity, price }),
            _ => Err(RfmError::extraction(format!(
                "missing required column 'amount' (accepted names: {}, or quantity with unit_price)",
                AMOUNT.join(", ")
            ))),
        }
    }

    fn read(&self, table: &Table, row: usize) -> Option<f64> {
        match *self {
            AmountSource::Column(col) => table.cell(row, col).and_then(parse_finite),
            AmountSource::QuantityTimesPrice { quantity, price } => {
                let quantity = table.cell(row, quantity).and_then(parse_finite)?;
                let price = table.cell(row, price).and_then(parse_finite)?;
                Some(quantity * price).filter(|v| v.is_finite())
            }
        }
    }
}

#[derive(Debug)]
struct CustomerActivity {
    latest: DateTime<Utc>,
    rows: u64,
    transaction_ids: HashSet<String>,
    /// Line items with a blank transaction id, each its own transaction
    unidentified: u64,
    monetary: f64,
}

fn extract_transactions(
    table: &Table,
    id_col: usize,
    reference_date: DateTime<Utc>,
) -> RfmResult<Extraction> {
    let date_col = required_column(table, "transaction_date", TRANSACTION_DATE)?;
    let amount = AmountSource::resolve(table)?;
    let txn_col = table.find_column(TRANSACTION_ID);

    let mut issues = ExtractionIssues::default();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut customers: Vec<(&str, Option<CustomerActivity>)> = Vec::new();

    for row in 0..table.height() {
        let Some(customer_id) = table.cell(row, id_col) else {
            issues.rows_missing_customer_id += 1;
            continue;
        };
        let slot = *index.entry(customer_id).or_insert_with(|| {
            customers.push((customer_id, None));
            customers.len() - 1
        });

        let Some(date) = table.cell(row, date_col).and_then(parse_timestamp) else {
            issues.unparseable_dates += 1;
            continue;
        };
        if date > reference_date {
            issues.future_dated += 1;
            continue;
        }
        let Some(value) = amount.read(table, row) else {
            issues.invalid_amounts += 1;
            continue;
        };

        let transaction_id = txn_col.and_then(|col| table.cell(row, col));

        let activity = customers[slot].1.get_or_insert_with(|| CustomerActivity {
            latest: date,
            rows: 0,
            transaction_ids: HashSet::new(),
            unidentified: 0,
            monetary: 0.0,
        });
        activity.latest = activity.latest.max(date);
        activity.rows += 1;
        match transaction_id {
            Some(id) => {
                activity.transaction_ids.insert(id.to_string());
            }
            None => activity.unidentified += 1,
        }
        activity.monetary += value;
    }

    let mut records = Vec::with_capacity(customers.len());
    for (customer_id, activity) in customers {
        let Some(activity) = activity else {
            issues.dropped_customers.push(customer_id.to_string());
            continue;
        };
        let frequency = if txn_col.is_some() {
            activity.transaction_ids.len() as u64 + activity.unidentified
        } else {
            activity.rows
        };
        records.push(CustomerRecord {
            customer_id: customer_id.to_string(),
            recency: Some(days_between(activity.latest, reference_date) as f64),
            frequency: Some(frequency),
            monetary: Some(activity.monetary),
        });
    }

    if records.is_empty() {
        return Err(RfmError::extraction(
            "no customer has a qualifying transaction",
        ));
    }

    Ok(Extraction {
        schema: InputSchema::Transactional,
        records,
        issues,
    })
}

fn report_issues(issues: &ExtractionIssues) {
    let counts = [
        (issues.rows_missing_customer_id, "rows without a customer id"),
        (issues.unparseable_dates, "rows with an unparseable transaction date"),
        (issues.future_dated, "rows dated after the reference date"),
        (issues.invalid_amounts, "rows with an invalid amount"),
        (issues.undefined_metrics, "undefined metric cells"),
        (issues.dropped_customers.len(), "customers without qualifying transactions"),
    ];
    for (count, what) in counts {
        if count > 0 {
            log::warn!("excluded {} {}", count, what);
        }
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_non_negative(value: &str) -> Option<f64> {
    parse_finite(value).filter(|v| *v >= 0.0)
}

fn parse_count(value: &str) -> Option<u64> {
    parse_non_negative(value)
        .filter(|v| v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}
