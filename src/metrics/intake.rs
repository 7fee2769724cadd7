//! Intake metrics
//!
//! Counters and histograms for upload batches, provider reports and rate limiting.

use crate::metrics::{intake_metric, MetricDoc, MetricType};

/// Metrics collection for the claims intake service
pub struct IntakeMetrics;

impl IntakeMetrics {
    /// Record a batch that passed validation and was stored
    pub fn record_batch_accepted(claims: usize) {
        ::metrics::counter!(intake_metric!(counter, "batches_accepted")).increment(1);
        ::metrics::counter!(intake_metric!(counter, "ingested")).increment(claims as u64);
        ::metrics::histogram!(intake_metric!(histogram, "batch_size")).record(claims as f64);
    }

    /// Record an upload rejected at decode, validation or storage
    pub fn record_batch_rejected() {
        ::metrics::counter!(intake_metric!(counter, "batches_rejected")).increment(1);
    }

    pub fn record_provider_query() {
        ::metrics::counter!(intake_metric!(counter, "provider_queries")).increment(1);
    }

    pub fn record_rate_limited() {
        ::metrics::counter!(intake_metric!(counter, "rate_limited")).increment(1);
    }

    pub fn register_metrics() {
        for doc in Self::metrics_documentation() {
            match doc.metric_type {
                MetricType::Counter => ::metrics::describe_counter!(doc.name, doc.help),
                MetricType::Histogram => ::metrics::describe_histogram!(doc.name, doc.help),
            }
        }
    }

    pub fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: intake_metric!(counter, "batches_accepted"),
                metric_type: MetricType::Counter,
                help: "Uploads whose every row validated and was stored",
            },
            MetricDoc {
                name: intake_metric!(counter, "batches_rejected"),
                metric_type: MetricType::Counter,
                help: "Uploads rejected before storage",
            },
            MetricDoc {
                name: intake_metric!(counter, "ingested"),
                metric_type: MetricType::Counter,
                help: "Claims persisted",
            },
            MetricDoc {
                name: intake_metric!(counter, "provider_queries"),
                metric_type: MetricType::Counter,
                help: "Top provider reports served",
            },
            MetricDoc {
                name: intake_metric!(counter, "rate_limited"),
                metric_type: MetricType::Counter,
                help: "Requests refused by the per-client limiter",
            },
            MetricDoc {
                name: intake_metric!(histogram, "batch_size"),
                metric_type: MetricType::Histogram,
                help: "Claims per accepted upload",
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_follow_convention() {
        let names: Vec<&str> = IntakeMetrics::metrics_documentation()
            .iter()
            .map(|doc| doc.name)
            .collect();
        assert!(names.contains(&"claims_batches_accepted_total"));
        assert!(names.contains(&"claims_ingested_total"));
        assert!(names.contains(&"claims_batch_size"));
        assert!(names.iter().all(|name| name.starts_with("claims_")));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        IntakeMetrics::record_batch_accepted(4);
        IntakeMetrics::record_batch_rejected();
        IntakeMetrics::record_rate_limited();
    }
}
