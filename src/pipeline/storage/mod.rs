// Claim persistence: storage trait and its backends

#[cfg(feature = "db")]
pub mod database;
pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryStorage;
pub use traits::ClaimStorage;

#[cfg(feature = "db")]
pub use database::DatabaseStorage;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Build the configured storage backend.
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn ClaimStorage>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory claim storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "db")]
        StorageBackend::Libsql => {
            info!("Using libSQL claim storage");
            Ok(Arc::new(DatabaseStorage::new(config).await?))
        }
        #[cfg(not(feature = "db"))]
        StorageBackend::Libsql => Err(crate::error::IntakeError::Config(
            "libsql storage requires building with the `db` feature".to_string(),
        )),
    }
}
