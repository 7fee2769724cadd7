/// Shared constants for the claims intake service

/// Media type an upload must declare before it is handed to the pipeline
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Multipart form field carrying the uploaded claims file
pub const CSV_FILE_FIELD: &str = "csv_file";

/// Strict service date layout: `MM/DD/YY HH:MM`, 24-hour clock, no seconds
pub const SERVICE_DATE_FORMAT: &str = "%m/%d/%y %H:%M";

/// Layout used when persisting timestamps as text
pub const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Number of decimal digits in a valid National Provider Identifier
pub const NPI_DIGITS: usize = 10;

/// Leading character every submitted procedure code carries
pub const PROCEDURE_PREFIX: char = 'D';

/// Providers returned by the top-providers report when the caller sets no limit
pub const DEFAULT_PROVIDER_LIMIT: usize = 10;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILTER: &str = "claims_intake=info";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// Top-providers endpoint: 6 requests per client per minute
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 6;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Round a monetary figure to whole cents (half away from zero)
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
