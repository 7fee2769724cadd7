//! Per-row coercions applied before validation.
//!
//! Resolves upload headers through the alias table, strips currency
//! formatting, parses provider NPIs and service dates. Constraint checks are
//! left to the validator; only values that cannot be coerced at all fail here.

pub mod aliases;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::constants::SERVICE_DATE_FORMAT;
use crate::domain::{RawRow, RawValue};
use crate::error::{IntakeError, Result};
use aliases::{FieldKind, CLAIM_FIELDS};

static SERVICE_DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{2} [0-9]{2}:[0-9]{2}$").expect("valid regex"));

/// A row whose values are keyed by canonical field name and coerced to their target kinds.
///
/// Fields absent from the upload are absent here too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    values: BTreeMap<&'static str, RawValue>,
}

impl NormalizedRow {
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.values.get(field)
    }

    pub fn insert(&mut self, field: &'static str, value: RawValue) {
        self.values.insert(field, value);
    }

    pub fn remove(&mut self, field: &str) -> Option<RawValue> {
        self.values.remove(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Normalize one uploaded row.
pub fn normalize(row: &RawRow) -> Result<NormalizedRow> {
    let mut normalized = NormalizedRow::default();

    for def in CLAIM_FIELDS {
        let Some(raw) = def.lookup(row) else {
            continue;
        };

        let value = match def.kind {
            FieldKind::Currency => normalize_currency(def.name, raw)?,
            FieldKind::Integer => normalize_integer(def.name, raw)?,
            FieldKind::Timestamp => normalize_timestamp(def.name, raw)?,
            FieldKind::Text => raw.clone(),
        };
        normalized.insert(def.name, value);
    }

    Ok(normalized)
}

/// Only `$` signs and surrounding whitespace are stripped; thousands separators are rejected.
pub fn normalize_currency(field: &'static str, value: &RawValue) -> Result<RawValue> {
    let RawValue::Text(text) = value else {
        return Ok(value.clone());
    };

    let cleaned = text.replace('$', "");
    let cleaned = cleaned.trim();
    let amount: f64 = cleaned.parse().map_err(|_| {
        IntakeError::parse(field, format!("could not convert '{text}' to a number"))
    })?;

    if !amount.is_finite() {
        return Err(IntakeError::parse(
            field,
            format!("'{text}' is not a finite amount"),
        ));
    }

    Ok(RawValue::Number(amount))
}

pub fn normalize_integer(field: &'static str, value: &RawValue) -> Result<RawValue> {
    let RawValue::Text(text) = value else {
        return Ok(value.clone());
    };

    text.trim()
        .parse::<i64>()
        .map(RawValue::Integer)
        .map_err(|_| IntakeError::parse(field, format!("could not convert '{text}' to an integer")))
}

pub fn normalize_timestamp(field: &'static str, value: &RawValue) -> Result<RawValue> {
    let RawValue::Text(text) = value else {
        return Ok(value.clone());
    };

    parse_service_date(text)
        .map(RawValue::Timestamp)
        .ok_or_else(|| {
            IntakeError::parse(
                field,
                format!("'{text}' does not match the format MM/DD/YY HH:MM"),
            )
        })
}

/// Parse a service date written strictly as `MM/DD/YY HH:MM`.
pub fn parse_service_date(text: &str) -> Option<NaiveDateTime> {
    if !SERVICE_DATE_SHAPE.is_match(text) {
        return None;
    }
    NaiveDateTime::parse_from_str(text, SERVICE_DATE_FORMAT).ok()
}
