use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::round_cents;
use crate::pipeline::processing::net_fee::compute_net_fee;

/// A single cell of an uploaded row.
///
/// The decoder only ever produces `Text`; the typed variants let callers build
/// rows whose values were already coerced, which normalization passes through.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Timestamp(NaiveDateTime),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

/// One uploaded line keyed by its header, exactly as spelled in the file
pub type RawRow = HashMap<String, RawValue>;

/// The validated base fields of a claim; everything except the id and the derived net fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFields {
    pub allowed_fees: f64,
    pub member_coinsurance: f64,
    pub member_copay: f64,
    pub plan_group: String,
    pub provider_fees: f64,
    pub provider_npi: i64,
    #[serde(default)]
    pub quadrant: String,
    pub service_date: NaiveDateTime,
    pub submitted_procedure: String,
    pub subscriber_number: String,
}

/// A validated dental claim.
///
/// Fields are read-only once constructed. `net_fee` is derived from the four
/// fee fields in [`Claim::new`] and re-derived on deserialization; any stored
/// net fee value is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StoredClaim")]
pub struct Claim {
    id: Uuid,
    fields: ClaimFields,
    net_fee: f64,
}

impl Claim {
    pub fn new(id: Uuid, fields: ClaimFields) -> Self {
        let net_fee = compute_net_fee(&fields);
        Self {
            id,
            fields,
            net_fee,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn net_fee(&self) -> f64 {
        self.net_fee
    }

    pub fn fields(&self) -> &ClaimFields {
        &self.fields
    }
}

/// Caller-facing JSON layout of a claim
#[derive(Serialize)]
struct ClaimView<'a> {
    id: Uuid,
    allowed_fees: f64,
    member_coinsurance: f64,
    member_copay: f64,
    net_fee: f64,
    plan_group: &'a str,
    provider_fees: f64,
    provider_npi: i64,
    quadrant: &'a str,
    service_date: NaiveDateTime,
    submitted_procedure: &'a str,
    subscriber_number: &'a str,
}

impl Serialize for Claim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = &self.fields;
        ClaimView {
            id: self.id,
            allowed_fees: fields.allowed_fees,
            member_coinsurance: fields.member_coinsurance,
            member_copay: fields.member_copay,
            net_fee: self.net_fee,
            plan_group: &fields.plan_group,
            provider_fees: fields.provider_fees,
            provider_npi: fields.provider_npi,
            quadrant: &fields.quadrant,
            service_date: fields.service_date,
            submitted_procedure: &fields.submitted_procedure,
            subscriber_number: &fields.subscriber_number,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct StoredClaim {
    id: Uuid,
    #[serde(flatten)]
    fields: ClaimFields,
}

impl From<StoredClaim> for Claim {
    fn from(stored: StoredClaim) -> Self {
        Claim::new(stored.id, stored.fields)
    }
}

/// Per-provider net fee rollup served by the top-providers report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider_npi: i64,
    pub total_net_fee: f64,
    pub claim_count: u64,
    pub average_net_fee: f64,
}

impl ProviderSummary {
    /// Build a summary; total and average are rounded to cents here.
    pub fn new(provider_npi: i64, total_net_fee: f64, claim_count: u64, average_net_fee: f64) -> Self {
        Self {
            provider_npi,
            total_net_fee: round_cents(total_net_fee),
            claim_count,
            average_net_fee: round_cents(average_net_fee),
        }
    }
}
