pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;

// Domain data shapes shared across layers
pub mod domain;

pub mod pipeline;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use error::{EtlError, Result};
pub use pipeline::{reconcile, run_etl, ReconcileOptions, RunSummary};
