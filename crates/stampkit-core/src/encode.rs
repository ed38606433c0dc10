//! Raster encoding to PNG and JPEG bytes.
//!
//! The compositor itself never touches disk; callers encode a
//! [`RasterImage`] here and decide where the bytes go. PNG accepts both
//! channel layouts, JPEG is RGB only.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::{Channels, RasterImage};

/// Errors that can occur while encoding a raster.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel buffer length doesn't match the raster's dimensions.
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The raster's channel layout is not supported by the target format.
    #[error("JPEG encoding requires an RGB raster")]
    UnsupportedChannels,

    /// The underlying encoder failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode a raster to JPEG bytes.
///
/// `quality` is clamped to 1-100; 90 is a good default for dataset exports.
/// Only RGB rasters are accepted, since JPEG carries no alpha.
pub fn encode_jpeg(raster: &RasterImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;
    if raster.channels != Channels::Rgb {
        return Err(EncodeError::UnsupportedChannels);
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a raster to PNG bytes, preserving alpha when present.
pub fn encode_png(raster: &RasterImage) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let color_type = match raster.channels {
        Channels::Rgb => ExtendedColorType::Rgb8,
        Channels::Rgba => ExtendedColorType::Rgba8,
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut buffer);

    encoder
        .write_image(&raster.pixels, raster.width, raster.height, color_type)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn validate(raster: &RasterImage) -> Result<(), EncodeError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }

    let expected =
        raster.width as usize * raster.height as usize * raster.bytes_per_pixel();
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }

    Ok(())
}
