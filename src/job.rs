//! Job and task models for batch conversion runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Raster dimensions in whole pixels. Both components are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count, computed in u64 so large targets never overflow.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Whether the job's sources are explicit files or a folder to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    File,
    Folder,
}

/// How target raster dimensions are derived from a document's intrinsic size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum SizeMode {
    /// Multiply the intrinsic size by a positive factor.
    Scale { factor: f64 },
    /// Use caller-supplied dimensions verbatim. Aspect reconciliation
    /// (crop or stretch) happens at render time, not here.
    Exact { size: PixelSize },
}

/// An opaque background color flattened under the rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Parses a background color string: exactly 6 hex digits, optional
/// leading `#`. Whitespace around the value is tolerated.
pub fn parse_background(value: &str) -> Option<Rgb> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb { r, g, b })
}

/// One conversion run's immutable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionJob {
    pub input_mode: InputMode,
    /// Explicit source files, or a single directory in folder mode.
    pub sources: Vec<PathBuf>,
    /// Destination directory; `None` places outputs next to their sources.
    pub output_dir: Option<PathBuf>,
    pub size_mode: SizeMode,
    /// Exact mode only: center-crop (cover) instead of stretch on
    /// aspect-ratio mismatch.
    pub crop: bool,
    /// Background color string, re-validated by the engine during scanning.
    pub background: Option<String>,
}

/// One unit of work, derived from the job per source at dispatch time and
/// owned exclusively by the worker executing it. The intrinsic and target
/// sizes are resolved inside the worker so each document is read only once.
#[derive(Debug, Clone)]
pub struct ConversionTask {
    pub index: u32,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub size_mode: SizeMode,
    pub crop: bool,
    pub background: Option<Rgb>,
}

/// Resolves where a source's raster output lands: same base name with a
/// `.png` extension, placed in `output_dir` when given, otherwise next to
/// the source. Existing files at the destination are overwritten.
pub fn resolve_destination(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => {
            let stem = source
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            dir.join(format!("{stem}.png"))
        }
        None => source.with_extension("png"),
    }
}
