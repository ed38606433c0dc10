//! Alpha blending of an RGBA overlay onto an opaque background.

use super::ComposeError;
use crate::decode::{Channels, RasterImage};

/// Blend a full-frame RGBA foreground over an RGB background.
///
/// For every pixel, `out = background * (1 - alpha) + foreground_rgb * alpha`
/// with `alpha = foreground_alpha / 255`. Both rasters must have identical
/// spatial dimensions.
///
/// # Errors
///
/// Returns [`ComposeError::DimensionMismatch`] when the two rasters differ
/// in width or height.
pub fn alpha_blend(
    background: &RasterImage,
    foreground: &RasterImage,
) -> Result<RasterImage, ComposeError> {
    if background.width != foreground.width || background.height != foreground.height {
        return Err(ComposeError::DimensionMismatch {
            background_width: background.width,
            background_height: background.height,
            overlay_width: foreground.width,
            overlay_height: foreground.height,
        });
    }

    let fg = foreground.to_rgba();
    let bg = background.to_rgb();

    let mut pixels = Vec::with_capacity(bg.pixels.len());
    for (bg_px, fg_px) in bg.pixels.chunks_exact(3).zip(fg.pixels.chunks_exact(4)) {
        let alpha = fg_px[3] as f64 / 255.0;
        for c in 0..3 {
            let v = bg_px[c] as f64 * (1.0 - alpha) + fg_px[c] as f64 * alpha;
            pixels.push(v.clamp(0.0, 255.0).round() as u8);
        }
    }

    Ok(RasterImage::new_rgb(bg.width, bg.height, pixels))
}

/// Blend an RGBA overlay into an RGB canvas with its top-left at
/// (`left`, `top`), which may be negative.
///
/// Only the intersection of the overlay with the canvas is touched; overlay
/// pixels falling outside are dropped.
pub(crate) fn blend_into(canvas: &mut RasterImage, overlay: &RasterImage, left: i64, top: i64) {
    debug_assert_eq!(canvas.channels, Channels::Rgb);
    debug_assert_eq!(overlay.channels, Channels::Rgba);

    for oy in 0..overlay.height as i64 {
        let cy = top + oy;
        if cy < 0 || cy >= canvas.height as i64 {
            continue;
        }
        for ox in 0..overlay.width as i64 {
            let cx = left + ox;
            if cx < 0 || cx >= canvas.width as i64 {
                continue;
            }

            let o_idx = overlay.pixel_index(ox as u32, oy as u32);
            let alpha = overlay.pixels[o_idx + 3] as f64 / 255.0;
            if alpha == 0.0 {
                continue;
            }

            let c_idx = canvas.pixel_index(cx as u32, cy as u32);
            for c in 0..3 {
                let v = canvas.pixels[c_idx + c] as f64 * (1.0 - alpha)
                    + overlay.pixels[o_idx + c] as f64 * alpha;
                canvas.pixels[c_idx + c] = v.clamp(0.0, 255.0).round() as u8;
            }
        }
    }
}
