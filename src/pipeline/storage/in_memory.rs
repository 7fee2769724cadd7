use super::traits::ClaimStorage;
use crate::domain::{Claim, ProviderSummary};
use crate::error::{IntakeError, Result};
use crate::pipeline::processing::aggregate::summarize_providers;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// In-memory storage implementation for development/testing
#[derive(Clone)]
pub struct InMemoryStorage {
    claims: Arc<Mutex<Vec<Claim>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            claims: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Claim>>> {
        self.claims
            .lock()
            .map_err(|_| IntakeError::database("claim store lock poisoned"))
    }
}

#[async_trait]
impl ClaimStorage for InMemoryStorage {
    async fn insert_all(&self, claims: &[Claim]) -> Result<()> {
        let mut stored = self.lock()?;

        let mut seen: HashSet<Uuid> = stored.iter().map(Claim::id).collect();
        for claim in claims {
            if !seen.insert(claim.id()) {
                return Err(IntakeError::database(format!(
                    "claim id {} already exists",
                    claim.id()
                )));
            }
        }

        stored.extend_from_slice(claims);
        debug!("Stored {} claim(s); {} total", claims.len(), stored.len());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Vec<Claim>> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(Vec::new());
        };

        let stored = self.lock()?;
        Ok(stored.iter().filter(|c| c.id() == id).cloned().collect())
    }

    async fn top_providers(&self, limit: usize) -> Result<Vec<ProviderSummary>> {
        let stored = self.lock()?;
        Ok(summarize_providers(&stored, limit))
    }

    async fn claim_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}
