//! CSV loading for aid-flow records.
//!
//! Rows that lack a required value, or carry an amount that is not a
//! positive number, are dropped as a filter. Only an unreadable source or
//! a header without the required columns fails the load.

use crate::core::record::{FlowRecord, FlowSet};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const DONOR_COLUMN: &str = "donor";
pub const RECIPIENT_COLUMN: &str = "recipient";
pub const AMOUNT_COLUMN: &str = "commitment_amount_usd_constant";
pub const YEAR_COLUMN: &str = "year";
pub const PURPOSE_COLUMN: &str = "coalesced_purpose_name";

const REQUIRED_COLUMNS: &[&str] = &[DONOR_COLUMN, RECIPIENT_COLUMN, AMOUNT_COLUMN, YEAR_COLUMN];

/// Errors that make a dataset unusable for every view.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open dataset '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),
}

/// Why a row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingField,
    BadAmount,
    BadYear,
    Malformed,
}

/// Summary of a load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub kept: usize,
    pub missing_field: usize,
    pub bad_amount: usize,
    pub bad_year: usize,
    pub malformed: usize,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.missing_field + self.bad_amount + self.bad_year + self.malformed
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingField => self.missing_field += 1,
            SkipReason::BadAmount => self.bad_amount += 1,
            SkipReason::BadYear => self.bad_year += 1,
            SkipReason::Malformed => self.malformed += 1,
        }
    }
}

/// Raw CSV row. Every field is optional so a sparse row reaches
/// validation instead of failing deserialization.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    donor: Option<String>,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    commitment_amount_usd_constant: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    coalesced_purpose_name: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    // Spreadsheet exports sometimes write years as "2008.0".
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

impl RawRow {
    fn into_record(self) -> Result<FlowRecord, SkipReason> {
        let donor = non_empty(self.donor).ok_or(SkipReason::MissingField)?;
        let recipient = non_empty(self.recipient).ok_or(SkipReason::MissingField)?;
        let amount_raw =
            non_empty(self.commitment_amount_usd_constant).ok_or(SkipReason::MissingField)?;
        let year_raw = non_empty(self.year).ok_or(SkipReason::MissingField)?;

        let amount: f64 = amount_raw.parse().map_err(|_| SkipReason::BadAmount)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SkipReason::BadAmount);
        }
        let year = parse_year(&year_raw).ok_or(SkipReason::BadYear)?;

        let record = FlowRecord::new(donor, recipient, amount, year);
        Ok(match non_empty(self.coalesced_purpose_name) {
            Some(purpose) => record.with_purpose(purpose),
            None => record,
        })
    }
}

/// Load flows from a CSV file on disk.
pub fn load_path(path: impl AsRef<Path>) -> Result<(FlowSet, LoadReport), LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    load_reader(file)
}

/// Load flows from CSV text held in memory.
pub fn load_str(text: &str) -> Result<(FlowSet, LoadReport), LoadError> {
    load_reader(text.as_bytes())
}

/// Load flows from any CSV byte source.
pub fn load_reader<R: Read>(reader: R) -> Result<(FlowSet, LoadReport), LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(LoadError::MissingColumn(column.to_string()));
        }
    }

    let mut set = FlowSet::new();
    let mut report = LoadReport::default();

    for (line, row) in csv_reader.deserialize::<RawRow>().enumerate() {
        let outcome = match row {
            Ok(raw) => raw.into_record(),
            Err(e) if e.is_io_error() => return Err(LoadError::Csv(e)),
            Err(e) => {
                debug!("row {}: unreadable ({})", line + 2, e);
                Err(SkipReason::Malformed)
            }
        };
        match outcome {
            Ok(record) => {
                set.add(record);
                report.kept += 1;
            }
            Err(reason) => {
                debug!("row {}: skipped ({:?})", line + 2, reason);
                report.record_skip(reason);
            }
        }
    }

    info!(
        "loaded {} flow records ({} skipped)",
        report.kept,
        report.skipped()
    );
    Ok((set, report))
}
