//! Intrinsic size inspection and folder scanning.
//!
//! A document's intrinsic size is resolved by usvg: explicit width/height
//! attributes first (units stripped), then the viewBox, then usvg's default
//! of 100x100 when neither is present. Non-positive or non-numeric
//! dimensions surface as parse errors and become `InvalidDocument`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ConvertError;
use crate::job::PixelSize;

/// Aggregate size information for one folder of SVG documents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSizeSummary {
    /// Count of entries that inspected successfully.
    pub total: u32,
    /// True when every inspected size equals `base_size` (trivially true
    /// for an empty folder).
    pub all_same: bool,
    /// Size of the first successfully inspected entry.
    pub base_size: Option<PixelSize>,
    /// Distinct sizes in first-seen order.
    pub unique_sizes: Vec<PixelSize>,
}

impl Default for FolderSizeSummary {
    fn default() -> Self {
        Self {
            total: 0,
            all_same: true,
            base_size: None,
            unique_sizes: Vec::new(),
        }
    }
}

pub(crate) fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Rounds a usvg tree's floating-point size up to whole pixels.
pub(crate) fn size_of_tree(tree: &usvg::Tree) -> PixelSize {
    let size = tree.size();
    PixelSize {
        width: size.width().ceil().max(1.0) as u32,
        height: size.height().ceil().max(1.0) as u32,
    }
}

/// Determines a document's intrinsic pixel dimensions.
///
/// Fails with `NotFound` when the file cannot be read and `InvalidDocument`
/// when it cannot be parsed or no usable dimension can be determined.
pub fn inspect_size(path: &Path) -> Result<PixelSize, ConvertError> {
    let data = fs::read(path).map_err(|source| ConvertError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default()).map_err(|e| {
        ConvertError::InvalidDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    let size = size_of_tree(&tree);
    debug!(path = %path.display(), size = %size, "inspected document");
    Ok(size)
}

/// Enumerates the immediate `.svg` files of a directory, sorted by path.
///
/// Non-recursive by design; subdirectories are ignored. The returned
/// iterator is finite and can be rebuilt by calling again.
pub fn svg_entries(dir: &Path) -> Result<impl Iterator<Item = PathBuf>, ConvertError> {
    let entries = fs::read_dir(dir).map_err(|source| ConvertError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_svg(p))
        .collect();
    files.sort();
    Ok(files.into_iter())
}

/// Aggregates size information across a folder, best-effort: entries that
/// fail inspection are skipped and logged, never counted, and never abort
/// the scan.
pub fn scan_folder(dir: &Path) -> Result<FolderSizeSummary, ConvertError> {
    let mut summary = FolderSizeSummary::default();
    for path in svg_entries(dir)? {
        let size = match inspect_size(&path) {
            Ok(size) => size,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping uninspectable entry");
                continue;
            }
        };
        summary.total += 1;
        match summary.base_size {
            None => summary.base_size = Some(size),
            Some(base) if base != size => summary.all_same = false,
            Some(_) => {}
        }
        if !summary.unique_sizes.contains(&size) {
            summary.unique_sizes.push(size);
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn write_svg(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn sized_svg(width: u32, height: u32) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><rect width="{width}" height="{height}" fill="green"/></svg>"#
        )
    }

    #[test]
    fn size_from_explicit_attributes() {
        let dir = tempdir().unwrap();
        let path = write_svg(dir.path(), "a.svg", &sized_svg(120, 80));
        assert_eq!(inspect_size(&path).unwrap(), PixelSize::new(120, 80));
    }

    #[test]
    fn size_from_view_box_when_attributes_absent() {
        let dir = tempdir().unwrap();
        let path = write_svg(
            dir.path(),
            "vb.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 50 25"><rect width="50" height="25"/></svg>"#,
        );
        assert_eq!(inspect_size(&path).unwrap(), PixelSize::new(50, 25));
    }

    #[test]
    fn default_size_when_nothing_declared() {
        let dir = tempdir().unwrap();
        let path = write_svg(
            dir.path(),
            "bare.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="10"/></svg>"#,
        );
        assert_eq!(inspect_size(&path).unwrap(), PixelSize::new(100, 100));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = inspect_size(&dir.path().join("nope.svg")).unwrap_err();
        assert!(matches!(err, ConvertError::NotFound { .. }));
    }

    #[test]
    fn garbage_is_invalid_document() {
        let dir = tempdir().unwrap();
        let path = write_svg(dir.path(), "bad.svg", "this is not markup");
        let err = inspect_size(&path).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDocument { .. }));
    }

    #[test]
    fn scan_reports_mixed_sizes() {
        let dir = tempdir().unwrap();
        write_svg(dir.path(), "a.svg", &sized_svg(100, 100));
        write_svg(dir.path(), "b.svg", &sized_svg(100, 100));
        write_svg(dir.path(), "c.svg", &sized_svg(200, 50));

        let summary = scan_folder(dir.path()).unwrap();
        assert_eq!(summary.total, 3);
        assert!(!summary.all_same);
        assert_eq!(summary.base_size, Some(PixelSize::new(100, 100)));
        assert_eq!(
            summary.unique_sizes,
            vec![PixelSize::new(100, 100), PixelSize::new(200, 50)]
        );
    }

    #[test]
    fn scan_skips_bad_entries_without_failing() {
        let dir = tempdir().unwrap();
        write_svg(dir.path(), "good.svg", &sized_svg(64, 64));
        write_svg(dir.path(), "bad.svg", "<svg");

        let summary = scan_folder(dir.path()).unwrap();
        assert_eq!(summary.total, 1);
        assert!(summary.all_same);
        assert_eq!(summary.base_size, Some(PixelSize::new(64, 64)));
    }

    #[test]
    fn scan_is_not_recursive() {
        let dir = tempdir().unwrap();
        write_svg(dir.path(), "top.svg", &sized_svg(32, 32));
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        write_svg(&sub, "below.svg", &sized_svg(32, 32));

        let summary = scan_folder(dir.path()).unwrap();
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn empty_folder_summary() {
        let dir = tempdir().unwrap();
        let summary = scan_folder(dir.path()).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.all_same);
        assert_eq!(summary.base_size, None);
        assert!(summary.unique_sizes.is_empty());
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        write_svg(dir.path(), "UPPER.SVG", &sized_svg(10, 10));
        write_svg(dir.path(), "notes.txt", "ignored");
        let found: Vec<_> = svg_entries(dir.path()).unwrap().collect();
        assert_eq!(found.len(), 1);
    }
}
