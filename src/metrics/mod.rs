//! Metrics infrastructure for the claims intake service
//!
//! A Prometheus recorder is installed once per process; its handle renders the
//! text exposition served on `/metrics`.

pub mod intake;

pub use intake::IntakeMetrics;

use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Initialize the global metrics recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("METRICS: handle already stored");
                }
                IntakeMetrics::register_metrics();
                info!("Prometheus recorder installed");
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
            }
        }
    });
}

/// Render the current snapshot, if a recorder was installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Builds metric names as `claims_{name}_total` for counters and `claims_{name}` otherwise
macro_rules! intake_metric {
    (counter, $name:literal) => {
        concat!("claims_", $name, "_total")
    };
    (histogram, $name:literal) => {
        concat!("claims_", $name)
    };
}

pub(crate) use intake_metric;
