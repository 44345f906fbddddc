//! svgpress command-line interface.
//!
//! Thin wrapper over the conversion engine:
//!
//! - `inspect <file>`: print a document's intrinsic size
//! - `scan <dir>`: print a folder's size summary as JSON
//! - `convert <sources...>`: run a batch conversion, streaming per-item
//!   results; Ctrl+C requests cooperative cancellation (in-flight work
//!   finishes, the rest is skipped)
//!
//! `RUST_LOG` controls log verbosity (default: warn, so item output stays
//! readable).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use svgpress::{
    inspect_size, run_job, scan_folder, ConversionJob, Event, InputMode, PixelSize, SizeMode,
    DEFAULT_CONCURRENCY,
};

/// Batch SVG to PNG converter
#[derive(Parser, Debug)]
#[command(version, about, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a document's intrinsic pixel size
    Inspect {
        /// SVG file path
        file: PathBuf,
    },

    /// Summarize the sizes of a folder's SVG documents
    Scan {
        /// Directory path (immediate entries only)
        dir: PathBuf,
    },

    /// Convert SVG documents to PNG
    Convert {
        /// Source SVG files, or a single directory with --folder
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Treat the single source argument as a folder to expand
        #[arg(long)]
        folder: bool,

        /// Destination directory (default: next to each source)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Scale factor applied to each document's intrinsic size
        #[arg(long, conflicts_with_all = ["width", "height"])]
        scale: Option<f64>,

        /// Exact output width in pixels
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Exact output height in pixels
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Exact mode: center-crop (cover) instead of stretch on
        /// aspect-ratio mismatch
        #[arg(long)]
        crop: bool,

        /// Background color to flatten under the content (RRGGBB or
        /// #RRGGBB); drops the alpha channel
        #[arg(long)]
        background: Option<String>,

        /// Worker pool size
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        jobs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { file } => {
            let size = inspect_size(&file)?;
            println!("{size}");
        }
        Commands::Scan { dir } => {
            let summary = scan_folder(&dir)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Convert {
            sources,
            folder,
            output_dir,
            scale,
            width,
            height,
            crop,
            background,
            jobs,
        } => {
            if folder && sources.len() != 1 {
                bail!("--folder takes exactly one directory argument");
            }
            let size_mode = match (scale, width, height) {
                (Some(factor), _, _) => SizeMode::Scale { factor },
                (None, Some(w), Some(h)) => SizeMode::Exact {
                    size: PixelSize::new(w, h),
                },
                _ => SizeMode::Scale { factor: 1.0 },
            };
            let job = ConversionJob {
                input_mode: if folder {
                    InputMode::Folder
                } else {
                    InputMode::File
                },
                sources,
                output_dir,
                size_mode,
                crop,
                background,
            };
            convert(job, jobs).await?;
        }
    }
    Ok(())
}

async fn convert(job: ConversionJob, jobs: usize) -> Result<()> {
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                eprintln!("cancellation requested, finishing in-flight work...");
                cancel.cancel();
            }
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Event::Item(item) = event {
                if item.ok {
                    println!(
                        "[{}/{}] {} -> {} ({}x{})",
                        item.index,
                        item.total,
                        item.source,
                        item.dest,
                        item.out_width.unwrap_or(0),
                        item.out_height.unwrap_or(0),
                    );
                } else {
                    eprintln!(
                        "[{}/{}] {} FAILED: {}",
                        item.index,
                        item.total,
                        item.source,
                        item.error.as_deref().unwrap_or("unknown error"),
                    );
                }
            }
        }
    });

    let summary = run_job(job, jobs, tx, cancel).await?;
    printer.await.context("event printer task failed")?;

    println!(
        "{}: {} ok, {} failed of {}",
        if summary.cancelled { "cancelled" } else { "done" },
        summary.ok,
        summary.failed,
        summary.total,
    );
    Ok(())
}
