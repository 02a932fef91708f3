//! ptrack-ingest - placement event ingestion CLI
//!
//! Imports the roster, ingests event CSVs into the deduplicated attendance
//! log, and prints log views and reports as JSON on stdout. Logs go to
//! stderr so output can be piped.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ptrack_common::config::{load_or_default, RootFolderResolver};
use ptrack_common::db::init_database;
use ptrack_ingest::db::LogStore;
use ptrack_ingest::sources::{read_events_csv, read_roster_csv, CsvEventSource};
use ptrack_ingest::IngestService;

/// Command-line arguments for ptrack-ingest
#[derive(Parser, Debug)]
#[command(name = "ptrack-ingest")]
#[command(about = "Resolve placement events against the roster into a deduplicated attendance log")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config_dir>/ptrack/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database (overrides PTRACK_ROOT_FOLDER and the config file)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the stored roster with a CSV upload
    ImportRoster { csv: PathBuf },
    /// Resolve an event CSV and merge it into the attendance log
    Ingest { csv: PathBuf },
    /// Print the full attendance log
    Log,
    /// Print entries with no roster match
    Unmatched,
    /// Assign an entry to a roster student
    Resolve {
        attendance_id: String,
        student_id: String,
    },
    /// Placement summary for one class
    Summary { class_id: String },
    /// Every logged event for one student
    Student { student_id: String },
    /// Recent ingest runs, newest first
    Runs {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_origin) =
        load_or_default(args.config.as_deref()).context("Failed to load config")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting ptrack-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_origin.log();

    let root_folder = RootFolderResolver::new(args.root_folder.clone()).resolve(&config);
    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let mut log_store = LogStore::new(pool.clone()).with_max_lock_wait(config.max_lock_wait_ms);
    if let Some(path) = config.default_events_path(&root_folder) {
        info!("Bootstrap events: {}", path.display());
        log_store = log_store.with_bootstrap_source(Arc::new(CsvEventSource::new(path)));
    }

    let service = IngestService::new(pool, log_store);

    match args.command {
        Command::ImportRoster { csv } => {
            let identities = read_roster_csv(&csv)
                .with_context(|| format!("Failed to read roster {}", csv.display()))?;
            print_json(&service.import_roster(&identities).await?)?;
        }
        Command::Ingest { csv } => {
            let events = read_events_csv(&csv)
                .with_context(|| format!("Failed to read events {}", csv.display()))?;
            print_json(&service.ingest_batch(&events).await?)?;
        }
        Command::Log => print_json(&service.get_log().await?)?,
        Command::Unmatched => print_json(&service.unmatched().await?)?,
        Command::Resolve {
            attendance_id,
            student_id,
        } => {
            let entry = service
                .resolve_manually(&attendance_id, &student_id)
                .await
                .context("Manual resolution failed")?;
            print_json(&entry)?;
        }
        Command::Summary { class_id } => print_json(&service.class_summary(&class_id).await?)?,
        Command::Student { student_id } => {
            print_json(&service.student_events(&student_id).await?)?
        }
        Command::Runs { limit } => print_json(&service.recent_runs(limit).await?)?,
    }

    Ok(())
}
