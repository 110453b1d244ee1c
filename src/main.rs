//! CLI entry point for gtfs_fusion.
//!
//! Provides subcommands for building the static indices, looking up static
//! entities, fusing live GTFS-RT feeds, writing index snapshots, and polling
//! all three feeds on an interval.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use gtfs_fusion::{
    Error,
    bootstrap::Bootstrap,
    config::{AppConfig, SourceKind},
    fetch::{FeedClient, FeedType},
    fusion::FusionEngine,
    output::{append_record, print_json, print_pretty, write_json},
    snapshot::{self, SnapshotSource},
    stats::FusionStats,
    table::{Table, TableSource},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_fusion")]
#[command(about = "Fuse GTFS-RT live feeds with a GTFS static schedule", long_about = None)]
struct Cli {
    /// Directory holding the GTFS text tables (overrides GTFS_STATIC_DIR)
    #[arg(short = 'd', long, global = true)]
    static_dir: Option<PathBuf>,

    /// Build the indices from snapshot artifacts instead of the text tables
    #[arg(long, global = true)]
    from_snapshot: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all static indices and print the readiness report
    Bootstrap,
    /// Print one static entity (or entity group) by id
    Lookup {
        /// trips, routes, shapes, stop_times or stops
        table: Table,

        id: String,
    },
    /// Fetch one live feed and print the fused records
    Fuse {
        /// alerts, trip-updates or vehicle-positions
        feed: FeedType,

        /// CSV file to append fusion statistics to
        #[arg(short, long)]
        stats_output: Option<String>,
    },
    /// Decode the text tables and write snapshot artifacts
    Snapshot {
        /// Directory to write the artifacts to (overrides GTFS_SNAPSHOT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Gzip compress the artifacts
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Fuse all three feeds concurrently on an interval
    Poll {
        /// Sample rate: query each feed every X seconds
        #[arg(short = 'r', long, default_value_t = 30)]
        sample_rate: u64,

        /// Number of samples to collect (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 1)]
        num_samples: usize,

        /// Rebuild the static indices every N rounds (0 = never)
        #[arg(long, default_value_t = 0)]
        rebuild_every: usize,

        /// Directory for per-feed daily statistics CSVs
        #[arg(short, long)]
        stats_output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_fusion.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_fusion.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.static_dir {
        config.static_dir = dir;
    }
    if cli.from_snapshot {
        config.source_kind = SourceKind::Snapshot;
    }

    match cli.command {
        Commands::Bootstrap => {
            let bootstrap = Bootstrap::new(config.index_source());
            let report = bootstrap.initialize_all().await;
            write_json(&report)?;
            if !report.is_complete() {
                warn!(
                    failed = report.failures().count(),
                    "Some indices failed to load"
                );
            }
        }
        Commands::Lookup { table, id } => {
            let bootstrap = Bootstrap::new(config.index_source());
            bootstrap.initialize_all().await;
            lookup(&bootstrap, table, &id).await?;
        }
        Commands::Fuse { feed, stats_output } => {
            let engine = engine(&config).await;
            match engine.fuse(feed).await {
                Ok(fused) => {
                    write_json(&fused.records)?;
                    if let Some(path) = stats_output {
                        append_record(&path, &FusionStats::from_fused(&fused))?;
                    }
                }
                Err(e) => {
                    if let Some(path) = stats_output {
                        let stats = FusionStats::from_error(error_type(&e), &e.to_string())
                            .with_feed(feed, None);
                        append_record(&path, &stats)?;
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Snapshot { output_dir, gzip } => {
            let dir = output_dir.unwrap_or_else(|| config.snapshot_dir.clone());
            let target = SnapshotSource::new(dir).with_gzip(gzip || config.snapshot_gzip);
            let written = snapshot::write_all(&TableSource::new(&config.static_dir), &target)?;
            info!(files = written.len(), dir = %target.dir().display(), "Snapshot complete");
        }
        Commands::Poll {
            sample_rate,
            num_samples,
            rebuild_every,
            stats_output,
        } => {
            poll(
                &config,
                sample_rate,
                num_samples,
                rebuild_every,
                stats_output,
            )
            .await?;
        }
    }

    Ok(())
}

/// Builds the indices once and wraps them in a [`FusionEngine`].
async fn engine(config: &AppConfig) -> FusionEngine {
    let bootstrap = Arc::new(Bootstrap::new(config.index_source()));
    let report = bootstrap.initialize_all().await;
    for failure in report.failures() {
        warn!(
            table = %failure.table,
            error = ?failure.error,
            "Index unavailable, lookups will miss"
        );
    }
    FusionEngine::new(
        FeedClient::basic(config.endpoints().clone(), config.timeout()),
        bootstrap,
    )
}

async fn lookup(bootstrap: &Bootstrap, table: Table, id: &str) -> Result<()> {
    let found = match table {
        Table::Trips => bootstrap.trip(id).await.map(serde_json::to_value),
        Table::Routes => bootstrap.route(id).await.map(serde_json::to_value),
        Table::Shapes => bootstrap.shape(id).await.map(serde_json::to_value),
        Table::StopTimes => bootstrap.stop_times(id).await.map(serde_json::to_value),
        Table::Stops => bootstrap.stop(id).await.map(serde_json::to_value),
    };

    match found {
        Some(value) => {
            let value = value?;
            print_pretty(&value);
            write_json(&value)
        }
        None => Err(Error::LookupMiss {
            table,
            id: id.to_string(),
        }
        .into()),
    }
}

fn error_type(e: &Error) -> &'static str {
    match e.kind() {
        gtfs_fusion::ErrorKind::Decode => "parse_error",
        gtfs_fusion::ErrorKind::NotReady => "not_ready",
        _ => "fetch_error",
    }
}

/// Fuses all three feeds concurrently every `sample_rate` seconds, optionally
/// rebuilding the indices in the background every `rebuild_every` rounds.
#[tracing::instrument(
    skip(config, stats_output),
    fields(sample_rate, num_samples, rebuild_every)
)]
async fn poll(
    config: &AppConfig,
    sample_rate: u64,
    num_samples: usize,
    rebuild_every: usize,
    stats_output: Option<String>,
) -> Result<()> {
    let engine = Arc::new(engine(config).await);

    if num_samples == 0 {
        info!(sample_rate, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, sample_rate, "Starting sample collection");
    }

    if let Some(ref dir) = stats_output {
        std::fs::create_dir_all(dir)?;
    }

    let mut sample_count = 0;

    loop {
        // Check if we've reached the sample limit (0 = infinite)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }

        sample_count += 1;

        info!(
            sample = sample_count,
            total = if num_samples == 0 {
                None
            } else {
                Some(num_samples)
            },
            "Starting sample round"
        );

        // Fusion keeps reading the previous set until the rebuild publishes.
        let rebuild = if rebuild_every > 0 && sample_count % rebuild_every == 0 {
            let bootstrap = engine.bootstrap().clone();
            Some(tokio::spawn(
                async move {
                    let report = bootstrap.rebuild().await;
                    info!(complete = report.is_complete(), "Indices rebuilt");
                }
                .instrument(tracing::info_span!("rebuild")),
            ))
        } else {
            None
        };

        let mut tasks = vec![];

        for feed_type in FeedType::ALL {
            let engine = engine.clone();
            let output_file = stats_output.as_ref().map(|dir| {
                let date = Utc::now().format("%Y-%m-%d");
                format!("{dir}/feed_type={feed_type}/date={date}.csv")
            });

            let feed_span = tracing::info_span!("process_feed", feed_type = %feed_type);

            let task = tokio::spawn(
                async move {
                    let stats = match engine.fuse(feed_type).await {
                        Ok(fused) => {
                            let stats = FusionStats::from_fused(&fused);
                            info!(
                                records = stats.total_records,
                                trip_match_pct = stats.trip_match_pct(),
                                "Feed fused successfully"
                            );
                            stats
                        }
                        Err(e) => {
                            error!(error = %e, "Feed fusion failed");
                            FusionStats::from_error(error_type(&e), &e.to_string())
                                .with_feed(feed_type, None)
                        }
                    };

                    match output_file {
                        Some(path) => {
                            if let Err(e) = append_record(&path, &stats) {
                                error!(error = %e, "Failed to write stats for feed");
                            }
                        }
                        None => {
                            if let Err(e) = print_json(&stats) {
                                error!(error = %e, "Failed to print stats for feed");
                            }
                        }
                    }
                }
                .instrument(feed_span),
            );

            tasks.push(task);
        }

        // Wait for all tasks to complete
        for task in tasks {
            join_logged(task, "Feed task failed").await;
        }
        if let Some(rebuild) = rebuild {
            join_logged(rebuild, "Index rebuild task failed").await;
        }

        // If not the last sample, wait before next iteration
        if num_samples == 0 || sample_count < num_samples {
            info!(sample_rate, "Waiting before next sample");
            tokio::time::sleep(tokio::time::Duration::from_secs(sample_rate)).await;
        }
    }

    info!("Finished polling all feeds");
    Ok(())
}

/// Awaits a spawned task, logging a panic or cancellation instead of
/// dropping it. Returns whether the task finished normally.
async fn join_logged(task: JoinHandle<()>, message: &'static str) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, panicked = e.is_panic(), "{message}");
            false
        }
    }
}
