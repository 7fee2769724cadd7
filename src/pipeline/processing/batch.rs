//! Batch assembly: runs every uploaded row through normalization, validation
//! and net fee derivation, then accepts or rejects the upload as a whole.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Claim, RawRow};
use crate::error::{BatchError, IntakeError};
use crate::pipeline::processing::normalize::normalize;
use crate::pipeline::processing::validate::validate;

/// Source of claim identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Outcome of a single data row
#[derive(Debug)]
pub struct RowOutcome {
    /// Zero-based data row index
    pub row: usize,
    pub result: Result<Claim, IntakeError>,
}

impl RowOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Claims accepted from one upload, in upload order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub claims: Vec<Claim>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[derive(Clone)]
pub struct BatchAssembler {
    ids: Arc<dyn IdGenerator>,
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchAssembler {
    pub fn new() -> Self {
        Self {
            ids: Arc::new(RandomIds),
        }
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self { ids: Arc::new(ids) }
    }

    /// Process one row. A fresh id is drawn only when the row validates.
    pub fn process_row(&self, row: &RawRow) -> Result<Claim, IntakeError> {
        let normalized = normalize(row)?;
        let fields = validate(&normalized)?;
        Ok(Claim::new(self.ids.next_id(), fields))
    }

    /// Every row's outcome, in upload order.
    pub fn evaluate(&self, rows: &[RawRow]) -> Vec<RowOutcome> {
        rows.iter()
            .enumerate()
            .map(|(row, raw)| RowOutcome {
                row,
                result: self.process_row(raw),
            })
            .collect()
    }

    /// Accept all rows or none; a rejection carries the first failing row.
    pub fn assemble(&self, rows: &[RawRow]) -> Result<BatchResult, BatchError> {
        let outcomes = self.evaluate(rows);
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

        let mut claims = Vec::with_capacity(outcomes.len());
        let mut first_failure = None;

        for outcome in outcomes {
            match outcome.result {
                Ok(claim) => claims.push(claim),
                Err(cause) => {
                    if first_failure.is_none() {
                        first_failure = Some(BatchError::new(outcome.row, cause));
                    }
                }
            }
        }

        if let Some(err) = first_failure {
            warn!(
                "Rejecting batch of {} row(s): {} row(s) failed, first at row {}",
                rows.len(),
                failed,
                err.row
            );
            return Err(err);
        }

        debug!("Assembled batch of {} claim(s)", claims.len());
        Ok(BatchResult { claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawValue;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Sequential(AtomicU64);

    impl IdGenerator for Sequential {
        fn next_id(&self) -> Uuid {
            Uuid::from_u128(self.0.fetch_add(1, Ordering::SeqCst) as u128)
        }
    }

    fn row(procedure: &str, provider: &str, allowed: &str, coinsurance: &str, copay: &str) -> RawRow {
        [
            ("service date", "03/28/18 00:00"),
            ("submitted procedure", procedure),
            ("quadrant", ""),
            ("Plan/Group #", "GRP-1000"),
            ("Subscriber#", "3730189502"),
            ("Provider NPI", "1497775530"),
            ("provider fees", provider),
            ("Allowed fees", allowed),
            ("member coinsurance", coinsurance),
            ("member copay", copay),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), RawValue::from(v)))
        .collect()
    }

    fn reference_rows() -> Vec<RawRow> {
        vec![
            row("D0180", "$100.00", "$100.00", "$0.00", "$0.00"),
            row("D0210", "$108.00", "$108.00", "$0.00", "$0.00"),
            row("D4346", "$130.00", "$65.00", "$16.25", "$0.00"),
            row("D4211", "$178.00", "$178.00", "$35.60", "$0.00"),
        ]
    }

    fn sequential_ids() -> BatchAssembler {
        BatchAssembler::with_id_generator(Sequential(AtomicU64::new(1)))
    }

    #[test]
    fn assembles_reference_upload_in_order() {
        let batch = sequential_ids().assemble(&reference_rows()).unwrap();

        let net_fees: Vec<f64> = batch.claims.iter().map(|c| c.net_fee()).collect();
        assert_eq!(net_fees, vec![0.0, 0.0, 81.25, 178.0 + 35.6 + 0.0 - 178.0]);
        assert!((net_fees[3] - 35.6).abs() < 1e-9);

        let procedures: Vec<&str> = batch
            .claims
            .iter()
            .map(|c| c.fields().submitted_procedure.as_str())
            .collect();
        assert_eq!(procedures, vec!["D0180", "D0210", "D4346", "D4211"]);

        let ids: Vec<u128> = batch.claims.iter().map(|c| c.id().as_u128()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn random_ids_are_distinct() {
        let batch = BatchAssembler::new().assemble(&reference_rows()).unwrap();
        let mut ids: Vec<Uuid> = batch.claims.iter().map(|c| c.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn one_bad_row_rejects_the_batch() {
        let mut rows = reference_rows();
        rows[2] = row("X4346", "$130.00", "$65.00", "$16.25", "$0.00");

        let err = BatchAssembler::new().assemble(&rows).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.field(), Some("submitted_procedure"));
        assert!(err.to_string().contains("submitted_procedure"));
    }

    #[test]
    fn reports_first_failure_when_several_rows_fail() {
        let mut rows = reference_rows();
        rows[1] = row("D0210", "$108.00", "-$1.00", "$0.00", "$0.00");
        rows[3] = row("D4211", "$178.00", "$178.00", "$35.60", "abc");

        let err = BatchAssembler::new().assemble(&rows).unwrap_err();
        assert_eq!(err.row, 1);
        assert_eq!(err.field(), Some("allowed_fees"));
    }

    #[test]
    fn evaluate_keeps_every_outcome() {
        let mut rows = reference_rows();
        rows[0] = row("D0180", "$100.00", "$100.00", "$0.00", "nope");

        let outcomes = BatchAssembler::new().evaluate(&rows);
        assert_eq!(outcomes.len(), 4);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1..].iter().all(RowOutcome::is_ok));
        assert_eq!(
            outcomes[0].result.as_ref().unwrap_err().field(),
            Some("member_copay")
        );
    }

    #[test]
    fn empty_upload_is_an_empty_batch() {
        let batch = BatchAssembler::new().assemble(&[]).unwrap();
        assert!(batch.is_empty());
    }
}
