//! Header alias table for claim uploads.
//!
//! Maps each canonical claim field to the header spellings accepted for it.
//! Upload headers are matched exactly; the canonical snake_case name is always
//! accepted as well.

use crate::domain::{RawRow, RawValue};

/// How a field's raw value is coerced before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Dollar amount, optionally written with a `$` sign
    Currency,
    /// Whole number
    Integer,
    /// `MM/DD/YY HH:MM` timestamp
    Timestamp,
    /// Passed through untouched
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

impl FieldDef {
    /// Find this field's value in a row, trying the upload alias before the canonical name.
    pub fn lookup<'a>(&self, row: &'a RawRow) -> Option<&'a RawValue> {
        self.aliases
            .iter()
            .chain(std::iter::once(&self.name))
            .find_map(|header| row.get(*header))
    }
}

pub const ALLOWED_FEES: &str = "allowed_fees";
pub const MEMBER_COINSURANCE: &str = "member_coinsurance";
pub const MEMBER_COPAY: &str = "member_copay";
pub const PLAN_GROUP: &str = "plan_group";
pub const PROVIDER_FEES: &str = "provider_fees";
pub const PROVIDER_NPI: &str = "provider_npi";
pub const QUADRANT: &str = "quadrant";
pub const SERVICE_DATE: &str = "service_date";
pub const SUBMITTED_PROCEDURE: &str = "submitted_procedure";
pub const SUBSCRIBER_NUMBER: &str = "subscriber_number";

/// Every claim field, in validation order
pub const CLAIM_FIELDS: &[FieldDef] = &[
    FieldDef {
        name: ALLOWED_FEES,
        aliases: &["Allowed fees"],
        kind: FieldKind::Currency,
    },
    FieldDef {
        name: MEMBER_COINSURANCE,
        aliases: &["member coinsurance"],
        kind: FieldKind::Currency,
    },
    FieldDef {
        name: MEMBER_COPAY,
        aliases: &["member copay"],
        kind: FieldKind::Currency,
    },
    FieldDef {
        name: PLAN_GROUP,
        aliases: &["Plan/Group #"],
        kind: FieldKind::Text,
    },
    FieldDef {
        name: PROVIDER_FEES,
        aliases: &["provider fees"],
        kind: FieldKind::Currency,
    },
    FieldDef {
        name: PROVIDER_NPI,
        aliases: &["Provider NPI"],
        kind: FieldKind::Integer,
    },
    FieldDef {
        name: QUADRANT,
        aliases: &[],
        kind: FieldKind::Text,
    },
    FieldDef {
        name: SERVICE_DATE,
        aliases: &["service date"],
        kind: FieldKind::Timestamp,
    },
    FieldDef {
        name: SUBMITTED_PROCEDURE,
        aliases: &["submitted procedure"],
        kind: FieldKind::Text,
    },
    FieldDef {
        name: SUBSCRIBER_NUMBER,
        aliases: &["Subscriber#"],
        kind: FieldKind::Text,
    },
];

pub fn field_def(name: &str) -> Option<&'static FieldDef> {
    CLAIM_FIELDS.iter().find(|def| def.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_wins_over_canonical_name() {
        let mut row = RawRow::new();
        row.insert("Provider NPI".to_string(), RawValue::from("1497775530"));
        row.insert("provider_npi".to_string(), RawValue::from("0"));

        let def = field_def(PROVIDER_NPI).unwrap();
        assert_eq!(def.lookup(&row), Some(&RawValue::from("1497775530")));
    }

    #[test]
    fn headers_are_matched_exactly() {
        let mut row = RawRow::new();
        row.insert("provider npi".to_string(), RawValue::from("1497775530"));

        assert_eq!(field_def(PROVIDER_NPI).unwrap().lookup(&row), None);
    }

    #[test]
    fn every_field_is_listed_once() {
        let mut names: Vec<&str> = CLAIM_FIELDS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }
}
