use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use movies_etl::app::ports::{MovieSink, WriteMode};
use movies_etl::config::Config;
use movies_etl::constants;
use movies_etl::domain::ReconcileStats;
use movies_etl::infra::{NdjsonSink, SqliteSink};
use movies_etl::logging;
use movies_etl::metrics;
use movies_etl::pipeline::{reconcile, run_etl, sources, ReconcileOptions};

#[derive(Parser)]
#[command(name = "movies_etl")]
#[command(about = "Reconcile scraped wiki movies with metadata and ratings into one store")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full ETL: load, reconcile, write movies and the rating log
    Run {
        #[arg(long, default_value = constants::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// SQLite database path (overrides config)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Write NDJSON files into this directory instead of SQLite
        #[arg(long)]
        ndjson_dir: Option<PathBuf>,
    },
    /// Reconcile only and report stage counts; nothing is written unless
    /// --export-dir is given
    Reconcile {
        #[arg(long, default_value = constants::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Export the reconciled movies as NDJSON into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

fn print_stats(stats: &ReconcileStats) {
    println!("\n📊 Reconcile results:");
    println!("   Wiki records: {}", stats.raw_records);
    println!("   Eligible movies: {}", stats.eligible_records);
    println!("   After dedup: {}", stats.deduplicated_records);
    println!("   Columns dropped: {}", stats.dropped_columns.len());
    println!(
        "   Metadata rows: {} ({} kept)",
        stats.metadata_records, stats.metadata_rows
    );
    println!("   Joined rows: {}", stats.joined_rows);
    println!("   Conflicting joins dropped: {}", stats.mismatched_joins_dropped);
    println!("   Rating events: {}", stats.rating_events);
}

async fn run(config: PathBuf, db: Option<PathBuf>, ndjson_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::load_from(&config)
        .with_context(|| format!("loading {}", config.display()))?;
    if let Some(db) = db {
        config.database.path = db;
    }

    let sink: Arc<dyn MovieSink> = match ndjson_dir {
        Some(dir) => {
            info!("Writing NDJSON output to {}", dir.display());
            Arc::new(NdjsonSink::new(dir))
        }
        None => {
            info!("Writing to SQLite database {}", config.database.path.display());
            Arc::new(SqliteSink::open(&config.database.path)?)
        }
    };

    let summary = run_etl(&config, sink).await?;
    print_stats(&summary.stats);
    println!("   Movies written: {}", summary.movies_written);
    println!(
        "   Ratings written: {} ({} chunks)",
        summary.ratings_written, summary.rating_chunks
    );
    println!("   Run id: {}", summary.run_id);
    Ok(())
}

async fn reconcile_only(config: PathBuf, export_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load_from(&config)
        .with_context(|| format!("loading {}", config.display()))?;

    let raw_records = sources::load_wiki_records(&config.sources.wiki_path)?;
    let metadata = sources::load_metadata(&config.sources.metadata_path)?;
    let ratings = sources::load_ratings(&config.sources.ratings_path)?;

    let table = reconcile(raw_records, metadata, &ratings, &ReconcileOptions::from(&config))?;
    print_stats(&table.stats);
    println!("   Reconciled movies: {}", table.len());

    if let Some(dir) = export_dir {
        let sink = NdjsonSink::new(&dir);
        let written = sink.write_movies(&table, WriteMode::Replace).await?;
        println!("   Exported {} movies to {}", written, dir.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging(constants::DEFAULT_LOG_DIR);
    metrics::init_metrics();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            db,
            ndjson_dir,
        } => run(config, db, ndjson_dir).await,
        Commands::Reconcile { config, export_dir } => reconcile_only(config, export_dir).await,
    };

    if let Err(e) = &result {
        error!("ETL failed: {:#}", e);
    }
    result
}
