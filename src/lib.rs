//! svgpress — batch SVG to PNG rasterization engine.
//!
//! This library converts vector documents into raster bitmaps under
//! user-chosen resize and background rules, for single files, explicit file
//! lists, or whole folders.
//!
//! ## Module Overview
//!
//! - `inspect`: intrinsic size inspection and folder scanning
//! - `plan`: target size planning (scale/exact modes, pixel ceiling)
//! - `render`: rasterization and aspect reconciliation via usvg + resvg
//! - `encode`: PNG encoding and output persistence
//! - `coordinator`: batch run state machine, bounded worker pool, events
//! - `job`: job, task, and color models
//! - `error`: engine error kinds
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use svgpress::{
//!     run_job, ConversionJob, Event, InputMode, SizeMode, DEFAULT_CONCURRENCY,
//! };
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let job = ConversionJob {
//!         input_mode: InputMode::File,
//!         sources: vec!["logo.svg".into()],
//!         output_dir: None,
//!         size_mode: SizeMode::Scale { factor: 2.0 },
//!         crop: false,
//!         background: Some("#ffffff".into()),
//!     };
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let printer = tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             if let Event::Item(item) = event {
//!                 println!("{} -> {} (ok: {})", item.source, item.dest, item.ok);
//!             }
//!         }
//!     });
//!
//!     let summary = run_job(job, DEFAULT_CONCURRENCY, tx, CancellationToken::new()).await?;
//!     printer.await?;
//!     println!("{} ok, {} failed", summary.ok, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod encode;
pub mod error;
pub mod inspect;
pub mod job;
pub mod plan;
pub mod render;

pub use coordinator::{
    run_job, Event, ItemOutcome, Phase, ProgressSnapshot, RunSummary, DEFAULT_CONCURRENCY,
};
pub use error::ConvertError;
pub use inspect::{inspect_size, scan_folder, svg_entries, FolderSizeSummary};
pub use job::{
    parse_background, resolve_destination, ConversionJob, ConversionTask, InputMode, PixelSize,
    Rgb, SizeMode,
};
pub use plan::{plan_target, MAX_PIXELS};
