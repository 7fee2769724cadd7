use super::traits::ClaimStorage;
use crate::config::StorageConfig;
use crate::constants::STORED_TIMESTAMP_FORMAT;
use crate::db::DatabaseManager;
use crate::domain::{Claim, ClaimFields, ProviderSummary};
use crate::error::{IntakeError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use libsql::Row;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

macro_rules! column {
    ($row:expr, $idx:expr, $name:literal) => {
        $row.get($idx)
            .map_err(|e| IntakeError::database(format!(concat!("Failed to get ", $name, ": {}"), e)))
    };
}

const CLAIM_COLUMNS: &str = "id, allowed_fees, member_coinsurance, member_copay, plan_group, \
     provider_fees, provider_npi, quadrant, service_date, submitted_procedure, subscriber_number";

/// Database storage implementation using Turso/libSQL
pub struct DatabaseStorage {
    db: Arc<DatabaseManager>,
}

impl DatabaseStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let db_manager = DatabaseManager::connect(config).await?;
        Self::from_manager(db_manager).await
    }

    pub async fn from_manager(db_manager: DatabaseManager) -> Result<Self> {
        db_manager.run_migrations().await?;
        Ok(Self {
            db: Arc::new(db_manager),
        })
    }

    /// Rebuild a claim from its base columns; the stored net fee is not read back.
    fn row_to_claim(row: &Row) -> Result<Claim> {
        let id: String = column!(row, 0, "id")?;
        let service_date: String = column!(row, 8, "service_date")?;

        let fields = ClaimFields {
            allowed_fees: column!(row, 1, "allowed_fees")?,
            member_coinsurance: column!(row, 2, "member_coinsurance")?,
            member_copay: column!(row, 3, "member_copay")?,
            plan_group: column!(row, 4, "plan_group")?,
            provider_fees: column!(row, 5, "provider_fees")?,
            provider_npi: column!(row, 6, "provider_npi")?,
            quadrant: column!(row, 7, "quadrant")?,
            service_date: NaiveDateTime::parse_from_str(&service_date, STORED_TIMESTAMP_FORMAT)
                .map_err(|e| IntakeError::database(format!("Invalid stored service_date: {e}")))?,
            submitted_procedure: column!(row, 9, "submitted_procedure")?,
            subscriber_number: column!(row, 10, "subscriber_number")?,
        };

        let id = Uuid::parse_str(&id)
            .map_err(|e| IntakeError::database(format!("Invalid claim UUID: {e}")))?;

        Ok(Claim::new(id, fields))
    }
}


#[async_trait]
impl ClaimStorage for DatabaseStorage {
    async fn insert_all(&self, claims: &[Claim]) -> Result<()> {
        let conn = self.db.get_connection()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to begin transaction: {e}")))?;

        for claim in claims {
            let fields = claim.fields();
            let result = tx
                .execute(
                    "INSERT INTO claims (id, allowed_fees, member_coinsurance, member_copay, net_fee, \
                     plan_group, provider_fees, provider_npi, quadrant, service_date, \
                     submitted_procedure, subscriber_number) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    libsql::params![
                        claim.id().to_string(),
                        fields.allowed_fees,
                        fields.member_coinsurance,
                        fields.member_copay,
                        claim.net_fee(),
                        fields.plan_group.clone(),
                        fields.provider_fees,
                        fields.provider_npi,
                        fields.quadrant.clone(),
                        fields.service_date.format(STORED_TIMESTAMP_FORMAT).to_string(),
                        fields.submitted_procedure.clone(),
                        fields.subscriber_number.clone()
                    ],
                )
                .await;

            if let Err(e) = result {
                tx.rollback()
                    .await
                    .map_err(|e| IntakeError::database(format!("Failed to roll back: {e}")))?;
                return Err(IntakeError::database(format!(
                    "Failed to insert claim {}: {e}",
                    claim.id()
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to commit claims: {e}")))?;

        info!("Persisted {} claim(s)", claims.len());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Vec<Claim>> {
        let conn = self.db.get_connection()?;

        let mut rows = conn
            .query(
                &format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = ?1"),
                libsql::params![id],
            )
            .await
            .map_err(|e| IntakeError::database(format!("Failed to query claims: {e}")))?;

        let mut claims = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to read row: {e}")))?
        {
            claims.push(Self::row_to_claim(&row)?);
        }

        debug!("Found {} claim(s) for id {}", claims.len(), id);
        Ok(claims)
    }

    async fn top_providers(&self, limit: usize) -> Result<Vec<ProviderSummary>> {
        let conn = self.db.get_connection()?;

        let mut rows = conn
            .query(
                "SELECT provider_npi, SUM(net_fee) AS total_net_fee, COUNT(id) AS claim_count, \
                 AVG(net_fee) AS avg_net_fee \
                 FROM claims GROUP BY provider_npi \
                 ORDER BY total_net_fee DESC, provider_npi ASC LIMIT ?1",
                libsql::params![limit as i64],
            )
            .await
            .map_err(|e| IntakeError::database(format!("Failed to query providers: {e}")))?;

        let mut summaries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to read row: {e}")))?
        {
            let npi: i64 = column!(&row, 0, "provider_npi")?;
            let total: f64 = column!(&row, 1, "total_net_fee")?;
            let count: i64 = column!(&row, 2, "claim_count")?;
            let average: f64 = column!(&row, 3, "avg_net_fee")?;
            summaries.push(ProviderSummary::new(npi, total, count as u64, average));
        }

        Ok(summaries)
    }

    async fn claim_count(&self) -> Result<usize> {
        let conn = self.db.get_connection()?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM claims", ())
            .await
            .map_err(|e| IntakeError::database(format!("Failed to count claims: {e}")))?;

        let count: i64 = match rows
            .next()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to read row: {e}")))?
        {
            Some(row) => column!(&row, 0, "count")?,
            None => 0,
        };
        Ok(count as usize)
    }
}
