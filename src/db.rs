use crate::config::StorageConfig;
use crate::error::{IntakeError, Result};
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::info;

pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Connect using the storage config: a local file when `path` is set,
    /// otherwise Turso via `LIBSQL_URL` / `LIBSQL_AUTH_TOKEN`.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::local(path).await,
            None => Self::remote_from_env().await,
        }
    }

    /// Create a new database manager with connection to Turso
    pub async fn remote_from_env() -> Result<Self> {
        let url = env::var("LIBSQL_URL")
            .map_err(|_| IntakeError::database("LIBSQL_URL environment variable not set"))?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN")
            .map_err(|_| IntakeError::database("LIBSQL_AUTH_TOKEN environment variable not set"))?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to connect to database: {e}")))?;

        Ok(Self { db })
    }

    /// Open (or create) a local database file
    pub async fn local(path: &str) -> Result<Self> {
        info!("Opening local database at {}", path);

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| IntakeError::database(format!("Failed to open database '{path}': {e}")))?;

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub fn get_connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| IntakeError::database(format!("Failed to get database connection: {e}")))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection()?;

        let migration_sql = include_str!("../migrations/001_create_claims.sql");
        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| IntakeError::database(format!("Failed to run migrations: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}
