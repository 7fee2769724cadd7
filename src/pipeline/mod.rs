// Claims intake pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

pub use processing::{BatchAssembler, BatchResult};
pub use storage::ClaimStorage;

use crate::error::Result;
use crate::metrics::IntakeMetrics;
use std::sync::Arc;
use tracing::{info, warn};

/// Decodes an upload, assembles it into claims and persists the batch.
pub struct IntakePipeline {
    assembler: BatchAssembler,
    storage: Arc<dyn ClaimStorage>,
}

impl IntakePipeline {
    pub fn new(storage: Arc<dyn ClaimStorage>) -> Self {
        Self {
            assembler: BatchAssembler::new(),
            storage,
        }
    }

    /// Assemble without persisting.
    pub fn dry_run(&self, content: &[u8]) -> Result<BatchResult> {
        let rows = ingestion::decode(content)?;
        Ok(self.assembler.assemble(&rows)?)
    }

    /// Run the upload end to end. Nothing is stored unless every row is valid.
    pub async fn ingest(&self, content: &[u8]) -> Result<BatchResult> {
        let batch = match self.dry_run(content) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Upload rejected: {}", e);
                IntakeMetrics::record_batch_rejected();
                return Err(e);
            }
        };

        if let Err(e) = self.storage.insert_all(&batch.claims).await {
            warn!("Failed to persist batch of {} claim(s): {}", batch.len(), e);
            IntakeMetrics::record_batch_rejected();
            return Err(e);
        }

        IntakeMetrics::record_batch_accepted(batch.len());
        info!("Processed {} claim(s)", batch.len());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntakeError;
    use crate::pipeline::storage::InMemoryStorage;

    const HEADER: &str = "service date,submitted procedure,quadrant,Plan/Group #,Subscriber#,Provider NPI,provider fees,Allowed fees,member coinsurance,member copay";

    fn upload(rows: &[&str]) -> Vec<u8> {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.into_bytes()
    }

    #[tokio::test]
    async fn ingest_persists_valid_batch() {
        let storage = Arc::new(InMemoryStorage::new());
        let pipeline = IntakePipeline::new(storage.clone());

        let batch = pipeline
            .ingest(&upload(&[
                "03/28/18 00:00,D0180,,GRP-1000,3730189502,1497775530,$100.00,$100.00,$0.00,$0.00",
                "03/28/18 00:00,D4346,,GRP-1000,3730189502,1497775530,$130.00,$65.00,$16.25,$0.00",
            ]))
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.claims[1].net_fee(), 81.25);
        assert_eq!(storage.claim_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn invalid_row_persists_nothing() {
        let storage = Arc::new(InMemoryStorage::new());
        let pipeline = IntakePipeline::new(storage.clone());

        let err = pipeline
            .ingest(&upload(&[
                "03/28/18 00:00,D0180,,GRP-1000,3730189502,1497775530,$100.00,$100.00,$0.00,$0.00",
                "03/28/18 00:00,X4346,,GRP-1000,3730189502,1497775530,$130.00,$65.00,$16.25,$0.00",
            ]))
            .await
            .unwrap_err();

        assert!(err.is_client_input());
        assert_eq!(err.field(), Some("submitted_procedure"));
        assert_eq!(storage.claim_count().await.unwrap(), 0);
    }

    #[test]
    fn dry_run_reports_decode_errors() {
        let pipeline = IntakePipeline::new(Arc::new(InMemoryStorage::new()));
        let err = pipeline.dry_run(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, IntakeError::Decode { .. }));
    }
}
