//! Load phase metrics: rows written to the sink

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_movies_written(rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "load", "movies_written")).increment(rows as u64);
    }

    pub fn record_rating_chunk(rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "load", "rating_chunks")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "load", "ratings_written")).increment(rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "load", "chunk_duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for LoadMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "load", "movies_written"));
        let _ = counter!(phase_metric!(counter, "load", "rating_chunks"));
        let _ = counter!(phase_metric!(counter, "load", "ratings_written"));
        let _ = histogram!(phase_metric!(histogram, "load", "chunk_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "load"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "load", "movies_written"),
                metric_type: MetricType::Counter,
                help: "Reconciled movie rows written",
            },
            MetricDoc {
                name: phase_metric!(counter, "load", "rating_chunks"),
                metric_type: MetricType::Counter,
                help: "Rating log chunks written",
            },
            MetricDoc {
                name: phase_metric!(counter, "load", "ratings_written"),
                metric_type: MetricType::Counter,
                help: "Rating events written",
            },
            MetricDoc {
                name: phase_metric!(histogram, "load", "chunk_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent writing one rating chunk",
            },
        ]
    }
}
