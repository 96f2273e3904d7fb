// Movie ETL pipeline: source loading, processing, reconciliation and the batch runner

pub mod processing;
pub mod reconcile;
pub mod runner;
pub mod sources;

pub use reconcile::{reconcile, ReconcileOptions};
pub use runner::{run_etl, RunSummary};
