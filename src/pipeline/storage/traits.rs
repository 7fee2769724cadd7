use crate::domain::{Claim, ProviderSummary};
use crate::error::Result;
use async_trait::async_trait;

/// Storage trait for persisting claims and serving read queries
#[async_trait]
pub trait ClaimStorage: Send + Sync {
    /// Persist a whole batch; either every claim is stored or none is.
    async fn insert_all(&self, claims: &[Claim]) -> Result<()>;

    /// Claims whose id matches; empty when none do.
    async fn find_by_id(&self, id: &str) -> Result<Vec<Claim>>;

    /// Providers ranked by total net fee, highest first.
    async fn top_providers(&self, limit: usize) -> Result<Vec<ProviderSummary>>;

    async fn claim_count(&self) -> Result<usize>;
}
