use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::fusion::AssayedFusion;
use crate::utils::validation::check_record_limit;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fusion file format: {0}")]
    InvalidFormat(String),

    #[error("Too many records: {0}")]
    TooManyRecords(String),
}

/// A record that failed validation and was left out of a [`RecordSet`]
#[derive(Debug, Clone, Serialize)]
pub struct DroppedRecord {
    /// 0-based position in the input array
    pub index: usize,
    pub reason: String,
}

/// Records that passed validation, plus the ones that were dropped
#[derive(Debug, Clone)]
pub struct RecordSet<T> {
    pub records: Vec<T>,
    /// Input position of each entry in `records`
    pub indices: Vec<usize>,
    pub dropped: Vec<DroppedRecord>,
}

impl<T> RecordSet<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records in the input, dropped ones included
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.records.len() + self.dropped.len()
    }
}

/// Read a text file, transparently decompressing `.gz` files
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or decompressed.
pub fn read_text(path: &Path) -> Result<String, ParseError> {
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if is_gzip {
        let file = std::fs::File::open(path)?;
        let mut decoder = flate2::read::GzDecoder::new(file);
        let mut content = String::new();
        decoder.read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Validate each JSON value independently, dropping the ones that fail
///
/// `kind` names the record type in log messages (e.g. "assayed fusion").
///
/// # Errors
///
/// Returns `ParseError::TooManyRecords` if the input exceeds the record limit.
pub fn parse_records<T: DeserializeOwned>(
    values: Vec<serde_json::Value>,
    kind: &str,
) -> Result<RecordSet<T>, ParseError> {
    if let Some(msg) = check_record_limit(values.len().saturating_sub(1)) {
        return Err(ParseError::TooManyRecords(msg));
    }

    let mut records = Vec::with_capacity(values.len());
    let mut indices = Vec::with_capacity(values.len());
    let mut dropped = Vec::new();

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                records.push(record);
                indices.push(index);
            }
            Err(e) => {
                warn!("Dropping {kind} record {index}: {e}");
                dropped.push(DroppedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    if !dropped.is_empty() {
        warn!("{} {kind} record(s) were dropped during validation", dropped.len());
    }
    debug!("Loaded {} {kind} record(s)", records.len());

    Ok(RecordSet {
        records,
        indices,
        dropped,
    })
}

/// Parse assayed fusions from JSON text holding an array of records
///
/// # Errors
///
/// Returns `ParseError::Json` if the text is not JSON, or
/// `ParseError::InvalidFormat` if the top level is not an array.
pub fn parse_assayed_text(text: &str) -> Result<RecordSet<AssayedFusion>, ParseError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value {
        serde_json::Value::Array(values) => parse_records(values, "assayed fusion"),
        _ => Err(ParseError::InvalidFormat(
            "expected a JSON array of assayed fusions".to_string(),
        )),
    }
}

/// Parse assayed fusions from a `.json` or `.json.gz` file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_assayed_file(path: &Path) -> Result<RecordSet<AssayedFusion>, ParseError> {
    let text = read_text(path)?;
    parse_assayed_text(&text)
}
