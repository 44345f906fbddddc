//! Rasterization and aspect reconciliation via usvg + resvg.
//!
//! Output buffers are tiny-skia pixmaps: RGBA, straight-alpha semantics,
//! transparent unless a background is flattened first. Rendering is
//! deterministic for identical document, size, and background inputs.

use std::path::Path;

use resvg::tiny_skia;

use crate::error::ConvertError;
use crate::job::{PixelSize, Rgb};

/// Parses raw SVG bytes into a usvg tree.
pub fn parse_document(data: &[u8], path: &Path) -> Result<usvg::Tree, ConvertError> {
    usvg::Tree::from_data(data, &usvg::Options::default()).map_err(|e| {
        ConvertError::InvalidDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

/// Picks the transform that maps the document onto the target buffer.
///
/// With `cover` set the document is scaled uniformly to the smallest size
/// that fully covers the target box and centered, so overflow on the longer
/// axis is cropped symmetrically by the buffer bounds. Otherwise each axis
/// is scaled independently: uniform when the aspect ratios match (always
/// the case in scale mode), a deliberate stretch when they do not.
fn reconcile_transform(source: usvg::Size, target: PixelSize, cover: bool) -> usvg::Transform {
    let src_w = source.width();
    let src_h = source.height();
    let dst_w = target.width as f32;
    let dst_h = target.height as f32;

    if cover {
        let scale = (dst_w / src_w).max(dst_h / src_h);
        let tx = (dst_w - src_w * scale) * 0.5;
        let ty = (dst_h - src_h * scale) * 0.5;
        usvg::Transform::from_row(scale, 0.0, 0.0, scale, tx, ty)
    } else {
        usvg::Transform::from_scale(dst_w / src_w, dst_h / src_h)
    }
}

/// Renders a parsed document into a pixmap of exactly `target` dimensions.
///
/// When `background` is given the buffer is pre-filled with that opaque
/// color and the content composited on top; otherwise alpha is preserved.
/// `cover` selects center-crop reconciliation (exact mode with crop
/// enabled).
pub fn rasterize(
    tree: &usvg::Tree,
    target: PixelSize,
    cover: bool,
    background: Option<Rgb>,
) -> Result<tiny_skia::Pixmap, ConvertError> {
    let mut pixmap =
        tiny_skia::Pixmap::new(target.width, target.height).ok_or_else(|| ConvertError::Render {
            reason: format!("cannot allocate {target} pixmap"),
        })?;

    if let Some(bg) = background {
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, 255));
    }

    let transform = reconcile_transform(tree.size(), target, cover);
    resvg::render(tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    // Left half red, right half blue, 2:1 aspect.
    const HALVES: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">
        <rect x="0" y="0" width="100" height="100" fill="#ff0000"/>
        <rect x="100" y="0" width="100" height="100" fill="#0000ff"/>
    </svg>"##;

    fn tree(svg: &str) -> usvg::Tree {
        parse_document(svg.as_bytes(), &PathBuf::from("test.svg")).unwrap()
    }

    fn rgb_at(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let px = pixmap.pixel(x, y).unwrap().demultiply();
        (px.red(), px.green(), px.blue(), px.alpha())
    }

    #[test]
    fn parse_failure_is_invalid_document() {
        let err = parse_document(b"nope", &PathBuf::from("x.svg")).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDocument { .. }));
    }

    #[test]
    fn output_matches_target_dimensions() {
        let pixmap = rasterize(&tree(HALVES), PixelSize::new(50, 40), false, None).unwrap();
        assert_eq!(pixmap.width(), 50);
        assert_eq!(pixmap.height(), 40);
    }

    #[test]
    fn stretch_fills_anisotropic_target() {
        let pixmap = rasterize(&tree(HALVES), PixelSize::new(100, 100), false, None).unwrap();
        // Stretched, not cropped: the full source still spans the buffer.
        assert_eq!(rgb_at(&pixmap, 10, 50), (255, 0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 90, 50), (0, 0, 255, 255));
    }

    #[test]
    fn cover_crops_symmetrically() {
        // 200x100 source into 100x100 target at cover scale 1.0: the
        // visible window is x in [50, 150) of the source, so 50 red
        // columns on the left and 50 blue on the right.
        let pixmap = rasterize(&tree(HALVES), PixelSize::new(100, 100), true, None).unwrap();
        assert_eq!(rgb_at(&pixmap, 10, 50), (255, 0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 40, 50), (255, 0, 0, 255));
        assert_eq!(rgb_at(&pixmap, 60, 50), (0, 0, 255, 255));
        assert_eq!(rgb_at(&pixmap, 90, 50), (0, 0, 255, 255));
    }

    #[test]
    fn transparent_without_background() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        let pixmap = rasterize(&tree(svg), PixelSize::new(10, 10), false, None).unwrap();
        let px = pixmap.pixel(5, 5).unwrap();
        assert_eq!(px.alpha(), 0);
    }

    #[test]
    fn background_flattens_uncovered_pixels() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        let bg = Rgb { r: 255, g: 0, b: 0 };
        let pixmap = rasterize(&tree(svg), PixelSize::new(10, 10), false, Some(bg)).unwrap();
        assert_eq!(rgb_at(&pixmap, 5, 5), (255, 0, 0, 255));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = rasterize(&tree(HALVES), PixelSize::new(64, 32), false, None).unwrap();
        let b = rasterize(&tree(HALVES), PixelSize::new(64, 32), false, None).unwrap();
        assert_eq!(a.data(), b.data());
    }
}
