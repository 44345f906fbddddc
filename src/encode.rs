//! PNG encoding and output persistence.

use std::fs;
use std::path::Path;

use resvg::tiny_skia;

use crate::error::ConvertError;

/// Serializes a pixmap to PNG bytes, 8 bits per channel.
///
/// With `opaque` set the alpha channel is dropped and the image is written
/// as RGB; callers set it exactly when a background was flattened, which
/// leaves every pixel fully opaque. Otherwise straight-alpha RGBA is
/// preserved.
pub fn encode_png(pixmap: &tiny_skia::Pixmap, opaque: bool) -> Result<Vec<u8>, ConvertError> {
    let channels = if opaque { 3 } else { 4 };
    let mut data = Vec::with_capacity(pixmap.pixels().len() * channels);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.push(c.red());
        data.push(c.green());
        data.push(c.blue());
        if !opaque {
            data.push(c.alpha());
        }
    }

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, pixmap.width(), pixmap.height());
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_color(if opaque {
            png::ColorType::Rgb
        } else {
            png::ColorType::Rgba
        });
        let mut writer = encoder.write_header().map_err(encode_err)?;
        writer.write_image_data(&data).map_err(encode_err)?;
        writer.finish().map_err(encode_err)?;
    }
    Ok(bytes)
}

fn encode_err(e: png::EncodingError) -> ConvertError {
    ConvertError::Render {
        reason: format!("png encoding failed: {e}"),
    }
}

/// Writes encoded bytes to `path`, creating missing parent directories and
/// overwriting any existing file without renaming.
pub fn persist(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConvertError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, bytes).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })
}
