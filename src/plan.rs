//! Target size planning for scale and exact modes.

use crate::error::ConvertError;
use crate::job::{PixelSize, SizeMode};

/// Hard upper bound on width x height of a planned raster. Rejects targets
/// whose memory and render cost would be excessive.
pub const MAX_PIXELS: u64 = 80_000_000;

/// Converts a job's size mode plus a document's intrinsic size into a
/// validated target raster size.
///
/// Scale mode rounds each axis and clamps to a 1 pixel minimum. Exact mode
/// passes the caller's dimensions through verbatim; aspect reconciliation
/// is the renderer's concern, not this layer's.
pub fn plan_target(mode: &SizeMode, intrinsic: PixelSize) -> Result<PixelSize, ConvertError> {
    let target = match *mode {
        SizeMode::Scale { factor } => {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ConvertError::InvalidDimensions(format!(
                    "scale factor must be a positive finite number, got {factor}"
                )));
            }
            PixelSize::new(
                (intrinsic.width as f64 * factor).round().max(1.0) as u32,
                (intrinsic.height as f64 * factor).round().max(1.0) as u32,
            )
        }
        SizeMode::Exact { size } => {
            if size.width == 0 || size.height == 0 {
                return Err(ConvertError::InvalidDimensions(
                    "exact width and height must be positive".into(),
                ));
            }
            size
        }
    };
    if target.pixel_count() > MAX_PIXELS {
        return Err(ConvertError::TooLarge {
            width: target.width,
            height: target.height,
        });
    }
    Ok(target)
}
