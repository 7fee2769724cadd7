//! Field constraint checks for normalized claim rows.
//!
//! Every field is checked independently and all violations for a row are
//! collected, so a rejected upload reports everything wrong with the failing row.

use chrono::NaiveDateTime;

use crate::constants::{NPI_DIGITS, PROCEDURE_PREFIX};
use crate::domain::{ClaimFields, RawValue};
use crate::error::{FieldViolation, ValidationError};
use crate::pipeline::processing::normalize::aliases::*;
use crate::pipeline::processing::normalize::NormalizedRow;

/// Check a normalized row and produce its typed fields.
pub fn validate(row: &NormalizedRow) -> Result<ClaimFields, ValidationError> {
    let mut violations = Vec::new();

    let allowed_fees = fee(row, ALLOWED_FEES, &mut violations);
    let member_coinsurance = fee(row, MEMBER_COINSURANCE, &mut violations);
    let member_copay = fee(row, MEMBER_COPAY, &mut violations);
    let plan_group = required_text(row, PLAN_GROUP, &mut violations).and_then(|group| {
        if group.is_empty() {
            violations.push(FieldViolation::new(PLAN_GROUP, "must not be empty"));
            None
        } else {
            Some(group)
        }
    });
    let provider_fees = fee(row, PROVIDER_FEES, &mut violations);
    let provider_npi = npi(row, &mut violations);
    let quadrant = optional_text(row, QUADRANT, &mut violations);
    let service_date = timestamp(row, SERVICE_DATE, &mut violations);
    let submitted_procedure = procedure(row, &mut violations);
    let subscriber_number = required_text(row, SUBSCRIBER_NUMBER, &mut violations);

    match (
        allowed_fees,
        member_coinsurance,
        member_copay,
        plan_group,
        provider_fees,
        provider_npi,
        quadrant,
        service_date,
        submitted_procedure,
        subscriber_number,
    ) {
        (
            Some(allowed_fees),
            Some(member_coinsurance),
            Some(member_copay),
            Some(plan_group),
            Some(provider_fees),
            Some(provider_npi),
            Some(quadrant),
            Some(service_date),
            Some(submitted_procedure),
            Some(subscriber_number),
        ) if violations.is_empty() => Ok(ClaimFields {
            allowed_fees,
            member_coinsurance,
            member_copay,
            plan_group,
            provider_fees,
            provider_npi,
            quadrant,
            service_date,
            submitted_procedure,
            subscriber_number,
        }),
        _ => Err(ValidationError::new(violations)),
    }
}

fn fee(row: &NormalizedRow, field: &'static str, violations: &mut Vec<FieldViolation>) -> Option<f64> {
    let amount = match row.get(field) {
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Integer(n)) => *n as f64,
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a number"));
            return None;
        }
        None => {
            violations.push(FieldViolation::missing(field));
            return None;
        }
    };

    // NaN fails this comparison too
    if amount >= 0.0 {
        Some(amount)
    } else {
        violations.push(FieldViolation::new(field, "must be greater than or equal to 0"));
        None
    }
}

fn npi(row: &NormalizedRow, violations: &mut Vec<FieldViolation>) -> Option<i64> {
    let value = match row.get(PROVIDER_NPI) {
        Some(RawValue::Integer(n)) => *n,
        Some(RawValue::Number(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => *n as i64,
        Some(_) => {
            violations.push(FieldViolation::new(PROVIDER_NPI, "must be an integer"));
            return None;
        }
        None => {
            violations.push(FieldViolation::missing(PROVIDER_NPI));
            return None;
        }
    };

    if is_valid_npi(value) {
        Some(value)
    } else {
        violations.push(FieldViolation::new(
            PROVIDER_NPI,
            "The Providers NPI number is invalid; should be 10 digits long.",
        ));
        None
    }
}

/// An NPI's decimal form must be exactly ten digits; leading zeros do not survive integer coercion.
pub fn is_valid_npi(value: i64) -> bool {
    let digits = value.to_string();
    digits.len() == NPI_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}

fn procedure(row: &NormalizedRow, violations: &mut Vec<FieldViolation>) -> Option<String> {
    let code = required_text(row, SUBMITTED_PROCEDURE, violations)?;
    if code.starts_with(PROCEDURE_PREFIX) {
        Some(code)
    } else {
        violations.push(FieldViolation::new(
            SUBMITTED_PROCEDURE,
            format!("The submitted procedure must start with the letter \"{PROCEDURE_PREFIX}\"."),
        ));
        None
    }
}

fn timestamp(
    row: &NormalizedRow,
    field: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<NaiveDateTime> {
    match row.get(field) {
        Some(RawValue::Timestamp(ts)) => Some(*ts),
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a valid datetime"));
            None
        }
        None => {
            violations.push(FieldViolation::missing(field));
            None
        }
    }
}

fn required_text(
    row: &NormalizedRow,
    field: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match row.get(field) {
        Some(RawValue::Text(s)) => Some(s.clone()),
        Some(RawValue::Integer(n)) => Some(n.to_string()),
        Some(_) => {
            violations.push(FieldViolation::new(field, "must be a string"));
            None
        }
        None => {
            violations.push(FieldViolation::missing(field));
            None
        }
    }
}

fn optional_text(
    row: &NormalizedRow,
    field: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    if row.get(field).is_none() {
        return Some(String::new());
    }
    required_text(row, field, violations)
}
