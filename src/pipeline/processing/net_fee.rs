//! Derived net fee calculation.

use crate::domain::ClaimFields;

/// Net fee owed for a claim.
///
/// `provider_fees + member_coinsurance + member_copay - allowed_fees`, evaluated
/// left to right with no rounding. Negative results are valid.
pub fn compute_net_fee(fields: &ClaimFields) -> f64 {
    net_fee(
        fields.provider_fees,
        fields.member_coinsurance,
        fields.member_copay,
        fields.allowed_fees,
    )
}

pub fn net_fee(provider_fees: f64, member_coinsurance: f64, member_copay: f64, allowed_fees: f64) -> f64 {
    provider_fees + member_coinsurance + member_copay - allowed_fees
}
