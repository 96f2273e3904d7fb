//! Metrics for the movie ETL
//!
//! Each pipeline phase owns a metrics struct in its own submodule. Names follow
//! `movies_etl_{phase}_{metric}` with a `_total` suffix on counters.

pub mod load;
pub mod reconcile;
pub mod registry;
pub mod sources;

pub use load::LoadMetrics;
pub use reconcile::ReconcileMetrics;
pub use sources::SourcesMetrics;

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Environment variable holding the Prometheus listener address
pub const METRICS_ADDR_ENV: &str = "MOVIES_ETL_METRICS_ADDR";

/// Install the Prometheus exporter when `MOVIES_ETL_METRICS_ADDR` is set.
///
/// Idempotent. Without the variable no recorder is installed and the metric
/// macros are no-ops.
pub fn init_metrics() {
    INIT.call_once(|| {
        let Ok(addr_str) = std::env::var(METRICS_ADDR_ENV) else {
            return;
        };
        let addr = match addr_str.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Invalid metrics addr '{}': {}", addr_str, e);
                return;
            }
        };

        let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        match builder.install() {
            Ok(()) => {
                info!("Prometheus exporter listening on http://{}/metrics", addr);
                registry::register_all_metrics();
            }
            Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
        }
    });
}

/// Implemented by each phase's metrics collection
pub trait PhaseMetrics {
    /// Touch every metric so it shows up before first use.
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Build a metric name following `movies_etl_{phase}_{name}`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("movies_etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("movies_etl_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("movies_etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
