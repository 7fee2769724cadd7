pub mod config;
pub mod constants;
#[cfg(feature = "db")]
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod rate_limiter;
pub mod server;

// Claim data shapes shared across layers
pub mod domain;
