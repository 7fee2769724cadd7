use std::fmt;
use thiserror::Error;

/// A single field-level constraint violation found while validating a claim row.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "field required")
    }
}

/// Every constraint a row violated, in field order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn first(&self) -> Option<&FieldViolation> {
        self.violations.first()
    }

    /// Whether any violation is attributed to `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        write!(
            f,
            "{} validation error{} for Claim",
            count,
            if count == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The first row-level failure of an upload; the whole batch is rejected with it.
#[derive(Error, Debug)]
#[error("row {row}: {cause}")]
pub struct BatchError {
    /// Zero-based index of the failing data row (the header is not counted).
    pub row: usize,
    #[source]
    pub cause: Box<IntakeError>,
}

impl BatchError {
    pub fn new(row: usize, cause: IntakeError) -> Self {
        Self {
            row,
            cause: Box::new(cause),
        }
    }

    /// Name of the offending field, when the cause is attributable to one.
    pub fn field(&self) -> Option<&'static str> {
        self.cause.field()
    }
}

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Error parsing CSV file: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    #[error("{field}: {message}")]
    Parse { field: &'static str, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("File type must be CSV.")]
    UnsupportedMediaType { content_type: Option<String> },

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Rate limit exceeded; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntakeError {
    pub fn decode(message: impl Into<String>, source: Option<csv::Error>) -> Self {
        Self::Decode {
            message: message.into(),
            source,
        }
    }

    pub fn parse(field: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            field,
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Field the error is attributed to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Parse { field, .. } => Some(*field),
            Self::Validation(err) => err.first().map(|v| v.field),
            Self::Batch(err) => err.field(),
            _ => None,
        }
    }

    /// Errors caused by the uploaded content rather than the service.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Parse { .. } | Self::Validation(_) | Self::Batch(_)
        )
    }
}

impl From<csv::Error> for IntakeError {
    fn from(error: csv::Error) -> Self {
        Self::Decode {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
