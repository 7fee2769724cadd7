use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// `RUST_LOG` takes precedence over the configured filter. The returned guard
/// must be held for the lifetime of the process so buffered file logs flush.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let _ = fs::create_dir_all(&config.directory);

    let file_appender = tracing_appender::rolling::daily(&config.directory, "claims_intake.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    // try_init so a second call (tests, embedded use) is a no-op
    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

/// Console-only logging for offline commands; nothing is written to disk.
pub fn init_console_logging(config: &LoggingConfig) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().join("logs").to_string_lossy().into_owned(),
            filter: "claims_intake=debug".to_string(),
        };

        let _guard = init_logging(&config);
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn console_logging_leaves_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().join("console-only").to_string_lossy().into_owned(),
            filter: "claims_intake=info".to_string(),
        };

        init_console_logging(&config);
        assert!(!dir.path().join("console-only").exists());
    }
}
