//! Error kinds for the conversion engine.
//!
//! Every failure a task can hit maps onto one of these variants. All of them
//! except [`ConvertError::Job`] are caught at the worker boundary and
//! downgraded into a failed item result; `Job` is detected during scanning
//! and aborts the run before any task is dispatched.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source document could not be read.
    #[error("cannot read {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source document is not parseable SVG or has no usable dimensions.
    #[error("invalid SVG document {}: {reason}", path.display())]
    InvalidDocument { path: PathBuf, reason: String },

    /// The requested scale factor or exact size is unusable.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// The planned raster exceeds the pixel ceiling.
    #[error("output too large: {width}x{height} exceeds the pixel ceiling")]
    TooLarge { width: u32, height: u32 },

    /// Rasterization or encoding failed for one document.
    #[error("render failed: {reason}")]
    Render { reason: String },

    /// A per-file read or write failed.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Job-level configuration problem; aborts the run before dispatch.
    #[error("job error: {0}")]
    Job(String),
}
