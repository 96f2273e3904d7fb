//! Reconcile phase metrics: row counts surviving each stage

use crate::domain::ReconcileStats;
use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ReconcileMetrics;

impl ReconcileMetrics {
    pub fn record_stats(stats: &ReconcileStats, output_rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "reconcile", "wiki_records_eligible"))
            .increment(stats.eligible_records as u64);
        ::metrics::counter!(phase_metric!(counter, "reconcile", "wiki_records_deduplicated"))
            .increment(stats.deduplicated_records as u64);
        ::metrics::counter!(phase_metric!(counter, "reconcile", "columns_dropped"))
            .increment(stats.dropped_columns.len() as u64);
        ::metrics::counter!(phase_metric!(counter, "reconcile", "mismatched_joins_dropped"))
            .increment(stats.mismatched_joins_dropped as u64);
        ::metrics::gauge!(phase_metric!(gauge, "reconcile", "output_rows")).set(output_rows as f64);
        ::metrics::histogram!(phase_metric!(histogram, "reconcile", "duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_failure(schema_violation: bool) {
        if schema_violation {
            ::metrics::counter!(phase_metric!(counter, "reconcile", "schema_violations")).increment(1);
        } else {
            ::metrics::counter!(phase_metric!(counter, "reconcile", "errors")).increment(1);
        }
    }
}

impl PhaseMetrics for ReconcileMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge, histogram};

        let _ = counter!(phase_metric!(counter, "reconcile", "wiki_records_eligible"));
        let _ = counter!(phase_metric!(counter, "reconcile", "wiki_records_deduplicated"));
        let _ = counter!(phase_metric!(counter, "reconcile", "columns_dropped"));
        let _ = counter!(phase_metric!(counter, "reconcile", "mismatched_joins_dropped"));
        let _ = counter!(phase_metric!(counter, "reconcile", "schema_violations"));
        let _ = counter!(phase_metric!(counter, "reconcile", "errors"));
        let _ = gauge!(phase_metric!(gauge, "reconcile", "output_rows"));
        let _ = histogram!(phase_metric!(histogram, "reconcile", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "reconcile"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "wiki_records_eligible"),
                metric_type: MetricType::Counter,
                help: "Wiki records passing the movie eligibility filter",
            },
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "wiki_records_deduplicated"),
                metric_type: MetricType::Counter,
                help: "Wiki movies left after IMDb id deduplication",
            },
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "columns_dropped"),
                metric_type: MetricType::Counter,
                help: "Sparse wiki columns dropped",
            },
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "mismatched_joins_dropped"),
                metric_type: MetricType::Counter,
                help: "Joined rows dropped by the release-date conflict rule",
            },
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "schema_violations"),
                metric_type: MetricType::Counter,
                help: "Runs aborted by a missing column or non-coercible value",
            },
            MetricDoc {
                name: phase_metric!(counter, "reconcile", "errors"),
                metric_type: MetricType::Counter,
                help: "Runs aborted by any other error",
            },
            MetricDoc {
                name: phase_metric!(gauge, "reconcile", "output_rows"),
                metric_type: MetricType::Gauge,
                help: "Reconciled rows produced by the last run",
            },
            MetricDoc {
                name: phase_metric!(histogram, "reconcile", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of one reconcile pass",
            },
        ]
    }
}
