//! Source loading metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct SourcesMetrics;

impl SourcesMetrics {
    pub fn record_load_success(source_name: &str, records: usize, duration_secs: f64) {
        let source = source_name.to_string();
        ::metrics::counter!(phase_metric!(counter, "sources", "loads_success"), "source" => source.clone())
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "sources", "records_loaded"), "source" => source.clone())
            .increment(records as u64);
        ::metrics::histogram!(phase_metric!(histogram, "sources", "load_duration_seconds"), "source" => source)
            .record(duration_secs);
    }

    pub fn record_load_error(source_name: &str) {
        ::metrics::counter!(phase_metric!(counter, "sources", "loads_error"), "source" => source_name.to_string())
            .increment(1);
    }
}

impl PhaseMetrics for SourcesMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "sources", "loads_success"));
        let _ = counter!(phase_metric!(counter, "sources", "loads_error"));
        let _ = counter!(phase_metric!(counter, "sources", "records_loaded"));
        let _ = histogram!(phase_metric!(histogram, "sources", "load_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "sources"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "sources", "loads_success"),
                metric_type: MetricType::Counter,
                help: "Source files loaded successfully",
            },
            MetricDoc {
                name: phase_metric!(counter, "sources", "loads_error"),
                metric_type: MetricType::Counter,
                help: "Source files that failed to load",
            },
            MetricDoc {
                name: phase_metric!(counter, "sources", "records_loaded"),
                metric_type: MetricType::Counter,
                help: "Records read across all sources",
            },
            MetricDoc {
                name: phase_metric!(histogram, "sources", "load_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent reading one source file",
            },
        ]
    }
}
