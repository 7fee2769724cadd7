//! Top-providers rollup over stored claims.

use std::collections::BTreeMap;

use crate::domain::{Claim, ProviderSummary};

/// Group claims by provider NPI and rank providers by total net fee, highest first.
///
/// Totals are summed in claim order and rounded only in the returned summaries.
/// Providers with equal totals are ordered by NPI.
pub fn summarize_providers(claims: &[Claim], limit: usize) -> Vec<ProviderSummary> {
    let mut groups: BTreeMap<i64, (f64, u64)> = BTreeMap::new();
    for claim in claims {
        let entry = groups.entry(claim.fields().provider_npi).or_insert((0.0, 0));
        entry.0 += claim.net_fee();
        entry.1 += 1;
    }

    let mut ranked: Vec<(i64, (f64, u64))> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.total_cmp(&a.1 .0));

    ranked
        .into_iter()
        .take(limit)
        .map(|(npi, (total, count))| ProviderSummary::new(npi, total, count, total / count as f64))
        .collect()
}
