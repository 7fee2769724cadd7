//! Tabular decoder for uploaded claim files.
//!
//! The first line is the header; every following line becomes a [`RawRow`]
//! keyed by the header names in their original casing and spacing. Any
//! structural problem rejects the whole upload.

use csv::ReaderBuilder;
use tracing::debug;

use crate::domain::{RawRow, RawValue};
use crate::error::{IntakeError, Result};

/// Decode raw upload bytes as UTF-8 CSV.
pub fn decode(content: &[u8]) -> Result<Vec<RawRow>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| IntakeError::decode(format!("upload is not valid UTF-8: {e}"), None))?;
    decode_str(text)
}

/// Decode CSV text. Empty input yields no rows.
pub fn decode_str(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), RawValue::from(value)))
            .collect();
        rows.push(row);
    }

    debug!("Decoded {} row(s) across {} column(s)", rows.len(), headers.len());
    Ok(rows)
}
