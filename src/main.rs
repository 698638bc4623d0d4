//! sharesift command-line entry.
//!
//! Three subcommands: `crawl` runs the engine over a root directory, `index`
//! bridges a completed CSV into the full-text index, `serve` exposes the
//! read-only search façade. Exit status is zero for completed runs no matter
//! how many per-file errors occurred; only startup configuration and I/O
//! failures exit non-zero.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sharesift::config::{self, CrawlConfig};
use sharesift::crawl_engine::DiscoveryPredicate;
use sharesift::search::{self, SearchEngine};

#[derive(Parser)]
#[command(name = "sharesift", version, about = "Filesystem document crawler for security audits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a root directory and append one CSV record per file
    Crawl {
        /// Root directory (e.g. smb/fs01/share for a mounted share)
        root: PathBuf,

        /// Worker concurrency
        #[arg(short = 'n', long)]
        threads: Option<usize>,

        /// Minimum file size in bytes
        #[arg(long)]
        min_size: Option<u64>,

        /// Maximum file size in bytes
        #[arg(long)]
        max_size: Option<u64>,

        /// Path substring exclusions (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Filename glob patterns; files must match one (repeatable)
        #[arg(long = "name")]
        name: Vec<String>,

        /// Only files modified on or after this date (YYYY-MM-DD)
        #[arg(long)]
        mtime_after: Option<String>,

        /// Only files modified on or before this date (YYYY-MM-DD)
        #[arg(long)]
        mtime_before: Option<String>,

        /// Enable content-hash dedup
        #[arg(long)]
        dedupe: bool,

        /// Directory for the CSV output and store files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Take an exclusive file lock per CSV append (multi-process output)
        #[arg(long)]
        lock_output: bool,
    },

    /// Build or update the full-text index from a completed CSV
    Index {
        /// CSV file produced by a crawl run
        csv: PathBuf,

        /// Index directory (default: <csv>.index)
        #[arg(long)]
        index_dir: Option<PathBuf>,

        /// Records per upsert batch
        #[arg(long, default_value_t = search::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Serve the read-only search façade
    Serve {
        /// Index directory built by `index`
        #[arg(long)]
        index_dir: PathBuf,

        /// Listen address
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

fn init_tracing(level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

fn parse_date(value: &str) -> Result<SystemTime> {
    let date = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))?;
    let secs = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0);
    Ok(UNIX_EPOCH + Duration::from_secs(secs.max(0) as u64))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            root,
            threads,
            min_size,
            max_size,
            exclude,
            name,
            mtime_after,
            mtime_before,
            dedupe,
            output_dir,
            lock_output,
        } => {
            let layered = config::load_layered()?;
            init_tracing(layered.log_level(), layered.log_file())?;

            let mut builder = CrawlConfig::builder_from(layered.clone()).root(root);
            if let Some(n) = threads {
                builder = builder.threads(n);
            }
            if dedupe {
                builder = builder.dedupe(true, layered.dedupe_hash());
            }
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            if lock_output {
                builder = builder.lock_output(true);
            }
            let config = builder.build();

            let mut predicate = DiscoveryPredicate {
                min_size,
                max_size,
                ..Default::default()
            };
            predicate.exclude_substrings = config
                .exclude_dirs()
                .iter()
                .cloned()
                .chain(exclude)
                .collect();
            if let Some(after) = &mtime_after {
                predicate.mtime_after = Some(parse_date(after)?);
            }
            if let Some(before) = &mtime_before {
                predicate.mtime_before = Some(parse_date(before)?);
            }
            let predicate = predicate.with_name_patterns(&name)?;

            let summary = sharesift::crawl(config, predicate)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            tracing::info!(
                stats = %serde_json::to_string(&summary.stats).unwrap_or_default(),
                "final counters"
            );
            println!(
                "processed {} skipped {} errors {} (of ~{}) -> {}",
                summary.stats.files_processed,
                summary.stats.files_skipped,
                summary.stats.files_error,
                summary.stats.files_total,
                summary.output_csv.display()
            );
            Ok(())
        }

        Commands::Index {
            csv,
            index_dir,
            batch_size,
        } => {
            let layered = config::load_layered()?;
            init_tracing(layered.log_level(), layered.log_file())?;

            let index_dir = index_dir.unwrap_or_else(|| {
                let mut dir = csv.as_os_str().to_os_string();
                dir.push(".index");
                PathBuf::from(dir)
            });
            let engine = SearchEngine::open(&index_dir)
                .map_err(|e| anyhow::anyhow!("failed to open index: {e}"))?;

            let report = tokio::task::spawn_blocking(move || {
                search::index_csv(&engine, &csv, batch_size)
            })
            .await
            .context("index task panicked")??;

            println!(
                "indexed {} records ({} skipped) in {} batches -> {}",
                report.indexed,
                report.skipped,
                report.batches,
                index_dir.display()
            );
            Ok(())
        }

        Commands::Serve { index_dir, addr } => {
            let layered = config::load_layered()?;
            init_tracing(layered.log_level(), layered.log_file())?;

            let engine = Arc::new(
                SearchEngine::open(&index_dir)
                    .map_err(|e| anyhow::anyhow!("failed to open index: {e}"))?,
            );
            sharesift::server::serve(engine, addr).await
        }
    }
}
