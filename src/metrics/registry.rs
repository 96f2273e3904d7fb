//! Registration of every phase's metrics, with duplicate-name detection

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{info, warn};

pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::sources::SourcesMetrics>(&mut all_metrics);
    register_phase_metrics::<super::reconcile::ReconcileMetrics>(&mut all_metrics);
    register_phase_metrics::<super::load::LoadMetrics>(&mut all_metrics);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if phase_of(doc.name) != phase_name {
            warn!(
                "Metric '{}' is registered by phase '{}' but named for '{}'",
                doc.name,
                phase_name,
                phase_of(doc.name)
            );
        }
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict: '{}' redefined by phase '{}'",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

/// Phase segment of a metric name (`movies_etl_load_rating_chunks_total` -> `load`)
pub fn phase_of(metric_name: &str) -> &str {
    metric_name
        .strip_prefix("movies_etl_")
        .and_then(|rest| rest.split('_').next())
        .unwrap_or("unknown")
}
