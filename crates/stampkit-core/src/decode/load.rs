//! Background and overlay loading with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use image::ImageReader;

use super::{DecodeError, Orientation, RasterImage};

/// Decode a background image (JPEG or PNG) into an opaque RGB raster.
///
/// EXIF orientation is read and applied before returning, so the pixel data
/// is always upright regardless of how the camera stored it. PNG files carry
/// no EXIF container and decode as-is.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognized
/// image format, `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_background(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = decode_dynamic(bytes)?;
    let oriented = apply_orientation(img, orientation);
    Ok(RasterImage::from_rgb_image(oriented.into_rgb8()))
}

/// Decode an overlay/stamp image into an RGBA raster.
///
/// An existing alpha channel (PNG) is preserved; alpha-less inputs are
/// promoted to alpha = 255 everywhere, so downstream rotation and blending
/// can treat every overlay uniformly.
pub fn decode_overlay(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    let img = decode_dynamic(bytes)?;
    Ok(RasterImage::from_rgba_image(img.into_rgba8()))
}

fn decode_dynamic(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let cursor = Cursor::new(bytes);
    let reader = ImageReader::new(cursor)
        .with_guessed_format()
        .map_err(|e| DecodeError::IoError(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => {
            if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                if let Some(value) = field.value.get_uint(0) {
                    return Orientation::from(value);
                }
            }
            Orientation::Normal
        }
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.fliph().rotate270(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.fliph().rotate90(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
