//! Comment crawler CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comment_crawler::{
    error::{AppError, Result},
    models::{Config, Target, ThreadKind},
    pipeline,
    storage::{CompletionLedger, CsvSink, descriptors},
    utils::{bvid, log},
};
use tracing::{error, info, warn};

/// Comment thread crawler
#[derive(Parser, Debug)]
#[command(
    name = "comment-crawler",
    version,
    about = "Crawls comment threads and their replies into CSV files"
)]
struct Cli {
    /// Data directory holding config, descriptors, ledger and output
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Config file (default: {data_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a single comment thread
    Crawl {
        /// Object id of the thread; primary threads also accept BV/av ids
        #[arg(long)]
        oid: String,

        /// Thread kind: primary, image, text or a numeric code
        #[arg(long, default_value = "primary")]
        kind: ThreadKind,

        /// First root-comment page
        #[arg(long)]
        start: Option<u32>,

        /// Last root-comment page
        #[arg(long)]
        end: Option<u32>,
    },

    /// Crawl every target in the descriptor files not yet completed
    Batch,

    /// Collect a user's threads into a descriptor file
    Discover {
        /// User id whose feed is walked
        #[arg(long)]
        user: String,
    },

    /// Draw random popular videos into a descriptor file
    Sample {
        /// Number of videos to pick
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Popular-list pages to collect candidates from
        #[arg(long, default_value_t = 6)]
        pages: u32,

        /// Output descriptor file, relative to the data directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Convert video ids between numeric and BV form
    Convert {
        /// Ids to convert (av170001, 170001 or BV...)
        ids: Vec<String>,

        /// File with one id per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output table for --file, relative to the data directory
        #[arg(long, default_value = "converted_ids.csv")]
        out: PathBuf,
    },

    /// Validate configuration
    Validate,

    /// Show data directory info
    Info,
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("config.toml"));

    let loaded = Config::load(&config_path);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.as_str())
        .unwrap_or("info");
    let _guard = log::init(log::effective_level(level, cli.verbose));

    let config = match loaded {
        Ok(config) => {
            info!(path = %config_path.display(), "configuration loaded");
            config
        }
        Err(e) if matches!(cli.command, Command::Validate) => {
            error!(path = %config_path.display(), error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "config load failed, using defaults");
            Config::default()
        }
    };

    match run(cli.command, config, &cli.data_dir).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "aborted");
            ExitCode::FAILURE
        }
    }
}

/// Run one subcommand; `Ok(false)` means it completed with failures.
async fn run(command: Command, config: Config, data_dir: &Path) -> Result<bool> {
    match command {
        Command::Crawl {
            oid,
            kind,
            start,
            end,
        } => {
            let config = config.with_page_range(start, end);
            let oid = match kind {
                ThreadKind::Primary => bvid::parse_aid(&oid)?.to_string(),
                _ => oid.trim().to_string(),
            };
            let target = Target::new(oid, kind);
            let report = pipeline::run_single(&config, data_dir, &target).await?;
            Ok(report.succeeded())
        }

        Command::Batch => {
            let report = pipeline::run_batch(&config, data_dir).await?;
            Ok(report.all_succeeded())
        }

        Command::Discover { user } => {
            pipeline::run_discovery(&config, data_dir, &user).await?;
            Ok(true)
        }

        Command::Sample { count, pages, out } => {
            pipeline::run_sample(&config, data_dir, count, pages, out.as_deref()).await?;
            Ok(true)
        }

        Command::Convert { ids, file, out } => {
            let mut ok = true;
            for id in &ids {
                match bvid::convert(id) {
                    Ok(c) => info!(source = %c.source, converted = %c.converted, direction = c.direction.label(), "converted"),
                    Err(e) => {
                        warn!(id = %id, error = %e, "conversion failed");
                        ok = false;
                    }
                }
            }
            if let Some(input) = file {
                let sink = CsvSink::new(data_dir);
                let report = pipeline::run_convert_file(&sink, &input, &out).await?;
                ok &= report.converted == report.total;
            } else if ids.is_empty() {
                return Err(AppError::validation("give ids to convert or --file"));
            }
            Ok(ok)
        }

        Command::Validate => {
            info!("Validating configuration...");
            config.validate()?;
            info!("All validations passed!");
            Ok(true)
        }

        Command::Info => {
            let output = &config.output;
            let targets_dir = output.targets_path(data_dir);
            let files = descriptors::descriptor_files(&targets_dir).await?;
            let ledger = CompletionLedger::open(output.ledger_path(data_dir)).await?;

            log::summary(
                "Data directory",
                &[
                    ("Root", data_dir.display().to_string()),
                    ("Comments", output.comments_path(data_dir).display().to_string()),
                    ("Targets", targets_dir.display().to_string()),
                    ("Descriptor files", files.len().to_string()),
                    ("Ledger", ledger.path().display().to_string()),
                    ("Completed targets", ledger.len().to_string()),
                ],
            );
            Ok(true)
        }
    }
}
