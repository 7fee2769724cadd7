use crate::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOG_DIR, DEFAULT_LOG_FILTER, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS,
};
use crate::error::{IntakeError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Libsql,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Local database file; when unset the libsql backend connects to Turso
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_LOG_DIR.to_string(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load `config.toml` when present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        let config = if path.exists() {
            Self::from_path(path)?
        } else {
            Self::default()
        };
        config.with_env()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            IntakeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CLAIMS_*` overrides from any key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(port) = lookup("CLAIMS_PORT") {
            self.server.port = parse_var("CLAIMS_PORT", &port)?;
        }
        if let Some(dir) = lookup("CLAIMS_LOG_DIR") {
            self.logging.directory = dir;
        }
        if let Some(backend) = lookup("CLAIMS_STORAGE") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "libsql" => StorageBackend::Libsql,
                other => {
                    return Err(IntakeError::Config(format!(
                        "CLAIMS_STORAGE must be 'memory' or 'libsql', got '{other}'"
                    )))
                }
            };
        }
        if let Some(path) = lookup("CLAIMS_DB_PATH") {
            self.storage.path = Some(path);
        }
        if let Some(requests) = lookup("CLAIMS_RATE_LIMIT_REQUESTS") {
            self.rate_limit.max_requests = parse_var("CLAIMS_RATE_LIMIT_REQUESTS", &requests)?;
        }
        if let Some(secs) = lookup("CLAIMS_RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_var("CLAIMS_RATE_LIMIT_WINDOW_SECS", &secs)?;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| IntakeError::Config(format!("{key} has an invalid value '{value}'")))
}
